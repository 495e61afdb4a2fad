pub mod table_display;
