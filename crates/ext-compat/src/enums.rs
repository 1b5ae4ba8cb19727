//! Enumerated constants matching the editor API's numeric values.
//!
//! `TreeItemCollapsibleState` and `StatusBarAlignment` live in the runtime
//! crate and are re-exported from the crate root alongside these.

/// Where a new editor column is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewColumn {
    Active = -1,
    Beside = -2,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
}

impl ViewColumn {
    pub const fn value(self) -> i32 {
        self as i32
    }
}

/// Scope a configuration update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationTarget {
    Global = 1,
    Workspace = 2,
    WorkspaceFolder = 3,
}

impl ConfigurationTarget {
    pub const fn value(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error = 0,
    Warning = 1,
    Information = 2,
    Hint = 3,
}

impl DiagnosticSeverity {
    pub const fn value(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLine {
    Lf = 1,
    Crlf = 2,
}

impl EndOfLine {
    pub const fn value(self) -> i32 {
        self as i32
    }
}

/// File kind reported by the filesystem proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Unknown = 0,
    File = 1,
    Directory = 2,
    SymbolicLink = 64,
}

impl FileType {
    pub const fn value(self) -> i32 {
        self as i32
    }
}
