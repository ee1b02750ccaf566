//! Convert output into the types of the [`geojson`](https://docs.rs/geojson) crate.
//!
//! `crs` members and the `properties` of a collection have no dedicated field there and are
//! carried as foreign members. An absent geometry (`false`) becomes `None`.

mod writer;
