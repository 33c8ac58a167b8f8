//! Prepared statements and parameter binding
//!
//! A statement owns its native prepared handle and a slot-indexed parameter
//! table sized once at prepare time from the placeholder count. Slots are
//! addressed with 1-based numbers matching placeholder positions. A slot
//! holds either a value snapshot or a handle to a shared cell that is read
//! at execute time, which enables binding once and re-executing with a
//! mutated value.

use super::cursor::{FetchMode, Fetched, ResultCursor};
use super::driver::{BindTag, RawConnection, RawStatement};
use super::error::{Error, Result};
use super::types::BindingKind;
use super::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// A shared mutable parameter cell
///
/// The statement reads the cell's current value when it executes, not when
/// the cell is bound. Cloning the cell clones the handle, not the value.
#[derive(Debug, Clone)]
pub struct ParamCell(Arc<Mutex<Value>>);

impl ParamCell {
    /// Create a cell holding an initial value
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(Mutex::new(value.into())))
    }

    /// Replace the cell's value
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.lock() = value.into();
    }

    /// Read the cell's current value
    pub fn get(&self) -> Value {
        self.0.lock().clone()
    }
}

/// One entry of the parameter table
#[derive(Debug, Clone)]
enum Slot {
    /// Never bound; executes as SQL NULL
    Unset,
    /// Snapshot taken at bind time
    Value(Value),
    /// Late-read handle, dereferenced at execute time
    Cell(ParamCell),
}

impl Slot {
    fn current(&self) -> Value {
        match self {
            Slot::Unset => Value::Null,
            Slot::Value(value) => value.clone(),
            Slot::Cell(cell) => cell.get(),
        }
    }
}

/// A prepared statement with a slot-indexed parameter table
///
/// Lifecycle: prepared, optionally bound, executed; a successful execute
/// that produced columns makes a result cursor available. Re-executing
/// discards the prior cursor. The statement borrows its connection and
/// cannot outlive it.
pub struct Statement<'conn, C: RawConnection + 'conn> {
    raw: C::Statement<'conn>,
    tags: Vec<BindTag>,
    slots: Vec<Slot>,
    cursor: Option<ResultCursor>,
    affected: u64,
    mode: FetchMode,
}

impl<'conn, C: RawConnection> Statement<'conn, C> {
    /// Wrap a freshly prepared native statement
    ///
    /// Reads the native placeholder count and initializes every slot tag to
    /// the default text kind.
    pub(crate) fn new(raw: C::Statement<'conn>) -> Self {
        let count = raw.param_count();
        Self {
            raw,
            tags: vec![BindTag::Text; count],
            slots: vec![Slot::Unset; count],
            cursor: None,
            affected: 0,
            mode: FetchMode::Both,
        }
    }

    /// Number of placeholders in the prepared text
    pub fn param_count(&self) -> usize {
        self.slots.len()
    }

    /// Bind a value snapshot into a 1-based slot
    ///
    /// The declared kind resolves through the fixed type-kind map and
    /// replaces the slot's tag. Rebinding a slot is allowed; the last write
    /// wins.
    pub fn bind_value(
        &mut self,
        slot: usize,
        value: impl Into<Value>,
        kind: BindingKind,
    ) -> Result<()> {
        let index = self.slot_index(slot)?;
        self.tags[index] = kind.bind_tag();
        self.slots[index] = Slot::Value(value.into());
        Ok(())
    }

    /// Bind a shared cell into a 1-based slot
    ///
    /// The cell's value is read at execute time, so mutating it between
    /// executes changes what the next execute sends.
    pub fn bind_cell(&mut self, slot: usize, cell: &ParamCell, kind: BindingKind) -> Result<()> {
        let index = self.slot_index(slot)?;
        self.tags[index] = kind.bind_tag();
        self.slots[index] = Slot::Cell(cell.clone());
        Ok(())
    }

    /// Execute with the accumulated per-slot tags and values
    ///
    /// Slots never bound are sent as SQL NULL under the default text tag.
    pub fn execute(&mut self) -> Result<()> {
        self.cursor = None;
        if !self.slots.is_empty() {
            let params: Vec<(BindTag, Value)> = self
                .tags
                .iter()
                .zip(&self.slots)
                .map(|(tag, slot)| (*tag, slot.current()))
                .collect();
            self.raw.bind(&params).map_err(Error::bind)?;
        }
        self.run()
    }

    /// Execute with an explicit parameter list
    ///
    /// Every value is bound under the default text tag, regardless of tags
    /// set by earlier `bind_value`/`bind_cell` calls. This mirrors the
    /// long-standing driver behavior; see DESIGN.md before changing it.
    pub fn execute_with(&mut self, params: &[Value]) -> Result<()> {
        self.cursor = None;
        if !self.slots.is_empty() {
            let params: Vec<(BindTag, Value)> = params
                .iter()
                .map(|value| (BindTag::Text, value.clone()))
                .collect();
            self.raw.bind(&params).map_err(Error::bind)?;
        }
        self.run()
    }

    fn run(&mut self) -> Result<()> {
        let outcome = self.raw.execute().map_err(Error::execution)?;
        trace!(
            affected = outcome.affected,
            has_result = outcome.result.is_some(),
            "statement executed"
        );
        self.affected = outcome.affected;
        self.cursor = outcome
            .result
            .map(|meta| ResultCursor::new(meta.columns, meta.num_rows));
        Ok(())
    }

    /// Set the sticky fetch shape consulted by [`fetch_next`](Self::fetch_next)
    /// and [`rows`](Self::rows)
    ///
    /// The shape persists across re-executes; statements start in
    /// [`FetchMode::Both`]. A column shape set here makes `fetch_next` fail,
    /// as column extraction is only valid for whole-result fetches.
    pub fn set_fetch_mode(&mut self, mode: FetchMode) {
        self.mode = mode;
    }

    /// Fetch the next row in the sticky shape
    pub fn fetch_next(&mut self) -> Result<Option<Fetched>> {
        self.fetch(self.mode)
    }

    /// Iterate the remaining rows in the sticky shape
    pub fn rows(&mut self) -> Rows<'_, 'conn, C> {
        Rows { statement: self }
    }

    /// Fetch the next row in the requested shape
    ///
    /// Returns `Ok(None)` once the result is exhausted. Fails with
    /// [`Error::NoResult`] when no cursor is live.
    pub fn fetch(&mut self, mode: FetchMode) -> Result<Option<Fetched>> {
        let cursor = self.cursor.clone().ok_or(Error::NoResult)?;
        match self.raw.fetch_row().map_err(Error::execution)? {
            Some(values) => Ok(Some(cursor.shape(values, mode)?)),
            None => Ok(None),
        }
    }

    /// Fetch all remaining rows in the requested shape
    ///
    /// `FetchMode::Column` extracts one column value per row.
    pub fn fetch_all(&mut self, mode: FetchMode) -> Result<Vec<Fetched>> {
        let cursor = self.cursor.clone().ok_or(Error::NoResult)?;
        let mut rows = Vec::new();
        while let Some(values) = self.raw.fetch_row().map_err(Error::execution)? {
            let fetched = match mode {
                FetchMode::Column(index) => {
                    Fetched::Column(cursor.extract_column(values, index)?)
                }
                other => cursor.shape(values, other)?,
            };
            rows.push(fetched);
        }
        Ok(rows)
    }

    /// Fetch one column of the next row
    ///
    /// Returns `Ok(None)` when no rows are left; exhaustion is a sentinel,
    /// not an error.
    pub fn fetch_column(&mut self, index: usize) -> Result<Option<Value>> {
        let cursor = self.cursor.clone().ok_or(Error::NoResult)?;
        match self.raw.fetch_row().map_err(Error::execution)? {
            Some(values) => cursor.extract_column(values, index).map(Some),
            None => Ok(None),
        }
    }

    /// Row count of the live cursor, or the affected-row count of the last
    /// execute when the statement produced no result set
    pub fn row_count(&self) -> u64 {
        match &self.cursor {
            Some(cursor) => cursor.num_rows(),
            None => self.affected,
        }
    }

    /// The live cursor, if the last execute produced one
    pub fn cursor(&self) -> Option<&ResultCursor> {
        self.cursor.as_ref()
    }

    /// Release the native result resources; always succeeds
    pub fn close_cursor(&mut self) {
        self.cursor = None;
        self.raw.free();
    }

    fn slot_index(&self, slot: usize) -> Result<usize> {
        if slot == 0 || slot > self.slots.len() {
            return Err(Error::slot_range(slot, self.slots.len()));
        }
        Ok(slot - 1)
    }
}

/// Iterator over the remaining rows of a statement
///
/// Rows are shaped per the statement's sticky fetch mode; each row fetch can
/// fail, so items are `Result`s.
pub struct Rows<'s, 'conn, C: RawConnection + 'conn> {
    statement: &'s mut Statement<'conn, C>,
}

impl<C: RawConnection> Iterator for Rows<'_, '_, C> {
    type Item = Result<Fetched>;

    fn next(&mut self) -> Option<Self::Item> {
        self.statement.fetch_next().transpose()
    }
}
