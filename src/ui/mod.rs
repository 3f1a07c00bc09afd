mod christmas_view;
mod diary_view;
mod gallery_view;
mod main_view;
mod mixer_view;

pub use christmas_view::draw_christmas_page;
pub use diary_view::{draw_diary_dock, draw_diary_page};
pub use gallery_view::draw_gallery_page;
pub use main_view::draw_main_view;
pub use mixer_view::draw_relax_room_page;
