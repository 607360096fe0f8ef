use callscope_types::LogLevel;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Quit,

    // UI toggles
    ToggleHelp,
    CloseOverlay,

    // Log list navigation
    SelectUp(usize),
    SelectDown(usize),
    SelectTop,
    SelectBottom,
    PageUp,
    PageDown,
    ToggleExpand,

    // View settings
    ToggleLevel(LogLevel),
    ToggleSortOrder,
    ToggleTimestamps,
    ToggleStats,

    // Search/Filter
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ApplyFilter,
    ClearFilter,
    ToggleCaseSensitive,

    // File
    Reload,

    // Error handling
    ShowError(String),
    DismissError,

    // Render request
    Render,
}
