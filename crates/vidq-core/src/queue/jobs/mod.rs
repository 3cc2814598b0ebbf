//! Job CRUD on the schedule database, split by direction.

mod read;
mod write;
