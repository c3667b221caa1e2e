// 🎛️ Build List Controller - commands in, write-through persistence out
//
// Owns the build list, the store it persists to and the drag engine. Every
// surface (terminal editor, command line, HTTP API) turns user actions into
// `Command`s and hands them here; rendering reads the state back out.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::build::BuildList;
use crate::drag::{DragReorder, RowBounds};
use crate::error::Result;
use crate::persistence::{self, DefaultDocument, HydrationSource};
use crate::row::{BuildRow, RowField};
use crate::store::KeyValueStore;

/// One discrete user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AddRow(BuildRow),
    EditRow {
        position: usize,
        field: RowField,
        value: String,
    },
    DeleteRow {
        position: usize,
    },
    Reorder {
        from: usize,
        to: usize,
    },
    Import {
        contents: String,
    },
    Clear,
}

pub struct BuildController<S: KeyValueStore> {
    list: BuildList,
    store: S,
    drag: DragReorder,
}

impl<S: KeyValueStore> BuildController<S> {
    pub fn new(list: BuildList, store: S) -> Self {
        BuildController {
            list,
            store,
            drag: DragReorder::new(),
        }
    }

    /// Build a controller from the store, the default document or the template
    pub fn hydrate(store: S, document: &dyn DefaultDocument) -> (Self, HydrationSource) {
        let (list, source) = persistence::hydrate(&store, document);
        (Self::new(list, store), source)
    }

    pub fn list(&self) -> &BuildList {
        &self.list
    }

    pub fn rows(&self) -> &[BuildRow] {
        self.list.rows()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn total(&self) -> f64 {
        self.list.total()
    }

    /// Dispatch a command to the matching operation
    pub fn apply(&mut self, command: Command) -> Result<()> {
        debug!(?command, "applying command");
        match command {
            Command::AddRow(row) => self.add_row(row),
            Command::EditRow {
                position,
                field,
                value,
            } => self.edit_row(position, field, &value).map(|_| ()),
            Command::DeleteRow { position } => self.delete_row(position).map(|_| ()),
            Command::Reorder { from, to } => self.reorder(from, to).map(|_| ()),
            Command::Import { contents } => self.import(&contents).map(|_| ()),
            Command::Clear => self.clear(),
        }
    }

    // ========================================================================
    // MUTATIONS (each one writes through)
    // ========================================================================

    pub fn add_row(&mut self, row: BuildRow) -> Result<()> {
        self.settle_drag()?;
        info!(category = %row.category, "adding row");
        self.list.push(row);
        self.persist()
    }

    /// Returns false (no write) when `position` is out of range
    pub fn edit_row(&mut self, position: usize, field: RowField, value: &str) -> Result<bool> {
        self.settle_drag()?;
        if !self.list.set_field(position, field, value) {
            debug!(position, "edit ignored, no such row");
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Returns false (no write) when `position` is out of range
    pub fn delete_row(&mut self, position: usize) -> Result<bool> {
        self.settle_drag()?;
        match self.list.remove(position) {
            Some(row) => {
                info!(position, category = %row.category, "deleted row");
                self.persist()?;
                Ok(true)
            }
            None => {
                debug!(position, "delete ignored, no such row");
                Ok(false)
            }
        }
    }

    /// Returns false (no write) for out-of-range or identical indexes
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<bool> {
        self.settle_drag()?;
        if !self.list.move_row(from, to) {
            return Ok(false);
        }
        info!(from, to, "reordered row");
        self.persist()?;
        Ok(true)
    }

    /// Empty the build and remove the stored key entirely
    pub fn clear(&mut self) -> Result<()> {
        self.drag.drop();
        info!(rows = self.list.len(), "clearing build");
        self.list.clear();
        persistence::clear_persisted(&mut self.store)
    }

    /// Replace the whole build with an imported file.
    ///
    /// On a format error the current build is left untouched.
    pub fn import(&mut self, contents: &str) -> Result<usize> {
        let rows = persistence::import_from_str(contents)?;
        self.drag.drop();
        let count = rows.len();
        self.list.replace(rows);
        info!(rows = count, "imported build");
        self.persist()?;
        Ok(count)
    }

    fn persist(&mut self) -> Result<()> {
        persistence::persist(&self.list, &mut self.store)
    }

    /// Commit a drag still in progress so positions in the next command
    /// refer to the order on screen
    fn settle_drag(&mut self) -> Result<()> {
        if let Some((origin, position)) = self.drag.drop() {
            debug!(from = origin, to = position, "settled drag before command");
            self.persist()?;
        }
        Ok(())
    }

    // ========================================================================
    // DRAG REORDER
    // ========================================================================

    pub fn dragged(&self) -> Option<usize> {
        self.drag.dragged()
    }

    pub fn drag_begin(&mut self, position: usize) -> bool {
        self.drag.begin(position, self.list.len())
    }

    /// Live reorder for one pointer move; not persisted until drop
    pub fn drag_move(&mut self, bounds: &[RowBounds], pointer_y: f64) -> Option<usize> {
        self.drag.pointer_moved(&mut self.list, bounds, pointer_y)
    }

    /// Commit the live order
    pub fn drag_drop(&mut self) -> Result<Option<(usize, usize)>> {
        let Some((origin, position)) = self.drag.drop() else {
            return Ok(None);
        };
        info!(from = origin, to = position, "dropped dragged row");
        self.persist()?;
        Ok(Some((origin, position)))
    }

    /// Put the dragged row back where it started
    pub fn drag_cancel(&mut self) -> bool {
        self.drag.cancel(&mut self.list)
    }
}
