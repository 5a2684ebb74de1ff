mod postgres;

pub use postgres::PostgresClinicalStore;
