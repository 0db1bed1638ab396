pub mod geometry;
pub mod logging;

#[cfg(test)]
pub mod testfd;
