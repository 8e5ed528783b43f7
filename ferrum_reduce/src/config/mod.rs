pub mod reduce_config;
