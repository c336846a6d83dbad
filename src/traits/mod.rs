pub mod stat_source;
