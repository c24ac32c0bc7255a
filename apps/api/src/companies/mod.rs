// Company records: create, list by industry, read, partial update, delete.

pub mod handlers;
