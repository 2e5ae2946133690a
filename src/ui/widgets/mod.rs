mod action;
mod diff_view;
mod help;
mod pair_list;
mod scroll;

pub use action::{Action, FocusTarget};
pub use diff_view::{DiffView, DiffViewState};
pub use help::HelpModal;
pub use pair_list::{PairList, PairListState};
pub use scroll::ScrollState;
