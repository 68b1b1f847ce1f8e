//! WebView message action codes.
//!
//! The numeric values mirror the host application's message enumeration and
//! must not be renumbered. Codes outside this table are still forwarded; they
//! only lose their symbolic name in diagnostics.

/// Known action selectors accepted by `HandleWebViewMsg`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebViewAction {
    GetPanelData = 0,
    GetInitialData = 1,
    SaveGraphicData = 2,
    UpdateEntry = 3,
    /// Lightweight device list.
    GetPanelsList = 4,
    GetPanelRangeInfo = 5,
    GetEntries = 6,
    LoadGraphicEntry = 7,
    OpenEntryEditWindow = 8,
    SaveImage = 9,
    SaveLibraryData = 10,
    DeleteImage = 11,
    GetSelectedDeviceInfo = 12,
    BindDevice = 13,
    SaveNewLibraryData = 14,
    /// Full device data sync.
    LoggingData = 15,
    /// Write full input/output/variable records.
    UpdateWebviewList = 16,
    /// Refresh input/output/variable records from the device.
    GetWebviewList = 17,
}

impl WebViewAction {
    /// Every known action, in code order.
    pub const ALL: [WebViewAction; 18] = [
        Self::GetPanelData,
        Self::GetInitialData,
        Self::SaveGraphicData,
        Self::UpdateEntry,
        Self::GetPanelsList,
        Self::GetPanelRangeInfo,
        Self::GetEntries,
        Self::LoadGraphicEntry,
        Self::OpenEntryEditWindow,
        Self::SaveImage,
        Self::SaveLibraryData,
        Self::DeleteImage,
        Self::GetSelectedDeviceInfo,
        Self::BindDevice,
        Self::SaveNewLibraryData,
        Self::LoggingData,
        Self::UpdateWebviewList,
        Self::GetWebviewList,
    ];

    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx))
            .copied()
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Host-side spelling of the action (including its historical typo).
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::GetPanelData => "GET_PANEL_DATA",
            Self::GetInitialData => "GET_INITIAL_DATA",
            Self::SaveGraphicData => "SAVE_GRAPHIC_DATA",
            Self::UpdateEntry => "UPDATE_ENTRY",
            Self::GetPanelsList => "GET_PANELS_LIST",
            Self::GetPanelRangeInfo => "GET_PANEL_RANGE_INFO",
            Self::GetEntries => "GET_ENTRIES",
            Self::LoadGraphicEntry => "LOAD_GRAPHIC_ENTRY",
            Self::OpenEntryEditWindow => "OPEN_ENTRY_EDIT_WINDOW",
            Self::SaveImage => "SAVE_IMAGE",
            Self::SaveLibraryData => "SAVE_LIBRAY_DATA",
            Self::DeleteImage => "DELETE_IMAGE",
            Self::GetSelectedDeviceInfo => "GET_SELECTED_DEVICE_INFO",
            Self::BindDevice => "BIND_DEVICE",
            Self::SaveNewLibraryData => "SAVE_NEW_LIBRARY_DATA",
            Self::LoggingData => "LOGGING_DATA",
            Self::UpdateWebviewList => "UPDATE_WEBVIEW_LIST",
            Self::GetWebviewList => "GET_WEBVIEW_LIST",
        }
    }
}

/// Symbolic name for `code`, if it is a known action.
#[must_use]
pub fn action_name(code: i32) -> Option<&'static str> {
    WebViewAction::from_code(code).map(WebViewAction::wire_name)
}
