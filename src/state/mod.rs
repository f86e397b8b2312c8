pub mod calendar;
pub mod completion;
pub mod grid;
pub mod holiday_store;
pub mod holidays;
