//! Widget actions - what widgets report happened
//!
//! These actions define the interface between widgets and App.

/// Actions that widgets can return from key handling.
/// App dispatches these to update other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No action, key was handled internally
    None,

    /// Key was not handled, pass to parent
    Ignored,

    /// Request focus change
    ChangeFocus(FocusTarget),

    // Pair list actions
    /// Cursor moved to another pair
    PairSelected(usize),
    /// Enter on a pair: show it and focus the diff
    OpenPair(usize),
    CycleFilter,

    // Global
    Quit,
    Refresh,
    ToggleHelp,
    /// Copy `file:line` of the cursor to the clipboard
    YankLocation,
    OpenInEditor,
}

/// Focus targets for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    PairList,
    Preview,
    Next,
    Prev,
}
