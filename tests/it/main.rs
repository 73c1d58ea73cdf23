mod dock_tests;
mod run_tests;
mod time_tests;
