pub mod chart;
pub mod controls;
pub mod debug;
pub mod header;
pub mod mark_list;
