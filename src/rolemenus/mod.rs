// Reaction role menus

pub mod store;

pub use store::{parse_menu_args, RoleMenu, RoleMenuEntry, RoleMenuError, RoleMenuStore};
