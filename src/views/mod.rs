// cloudmark view models
// View models hold the state behind the two routes: the session guard, the
// bookmark list, the per-row edit controller, and the entry/login view.

pub mod bookmark_list;
pub mod dashboard;
pub mod edit_controller;
pub mod entry;
pub mod session_guard;
