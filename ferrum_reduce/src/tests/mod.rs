pub mod support;

mod reduce_task_tests;
