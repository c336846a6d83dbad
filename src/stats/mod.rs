pub mod proc_stat_source;
