// PC Build Planner - Core Library
// Exposes all modules for use in the terminal editor, CLI, API server, and tests

pub mod error;
pub mod categories;  // Category Registry - names and icons
pub mod row;         // Row Model - one line item
pub mod build;       // Build List - ordered rows and totals
pub mod store;       // Local durable key-value store
pub mod persistence; // Hydration, write-through, export/import
pub mod drag;        // Drag Reorder Engine
pub mod summary;     // Totals formatting and shareable summary
pub mod controller;  // Commands and write-through mutations
pub mod config;
pub mod logging;

// Only compile the terminal editor when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use error::{BuildError, FormatError, Result};
pub use categories::{CategoryEntry, CategoryRegistry, DEFAULT_ICON};
pub use row::{BuildRow, RowField};
pub use build::BuildList;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, BUILD_KEY};
pub use persistence::{
    BundledDocument, DefaultDocument, HydrationSource, NoDefaultDocument,
    document_for, hydrate, persist, template,
    export_to_string, export_to_file, export_csv, import_from_str, import_from_file,
    EXPORT_FILENAME, TEMPLATE_CATEGORIES,
};
#[cfg(feature = "remote")]
pub use persistence::HttpDocument;
pub use drag::{DragReorder, DragState, RowBounds};
pub use summary::{
    ClipboardSink, MemoryClipboard, Osc52Clipboard,
    copy_summary, format_grouped, format_summary, format_total,
};
pub use controller::{BuildController, Command};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
