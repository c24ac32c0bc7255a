// Candidate applications, always stored in Postgres.

pub mod handlers;
