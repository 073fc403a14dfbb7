//! Change set application.
//!
//! Applies a change set to a target value in place. Each change walks its
//! full path with both create-on-miss policies enabled, then writes or
//! deletes at the addressed slot. The application is wrapped in a panic
//! guard: nothing below this boundary is expected to panic, but if
//! anything does it surfaces as a typed [`PatchError`] instead of
//! unwinding through the caller.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use converge_types::{deep_copy, TypedValue};

use crate::change::ChangeSet;
use crate::cursor::{Cursor, CursorConfig};
use crate::error::{PatchError, PatchResult};

const PATCH_CONFIG: CursorConfig = CursorConfig {
    create_missing_containers: true,
    create_missing_values: true,
};

impl ChangeSet {
    /// Apply this change set to a target of the base type, in place.
    ///
    /// Changes are applied in order. A rejected step (type mismatch,
    /// malformed path, unsatisfiable delete) surfaces as a [`PatchError`]
    /// and leaves the target with every preceding change applied.
    pub fn apply(&self, target: &mut TypedValue) -> PatchResult<()> {
        if target.ty() != self.base() {
            return Err(PatchError::BaseTypeMismatch);
        }

        match catch_unwind(AssertUnwindSafe(|| self.apply_unguarded(target))) {
            Ok(result) => result,
            Err(payload) => Err(PatchError::Internal(panic_message(payload.as_ref()))),
        }
    }

    fn apply_unguarded(&self, target: &mut TypedValue) -> PatchResult<()> {
        let (ty, value) = target.parts_mut();
        for change in self.changes() {
            let cursor = Cursor::new(ty, &mut *value, change.path(), PATCH_CONFIG);
            match change.new_value() {
                Some(new) => cursor.set(deep_copy(new))?,
                None => cursor.delete()?,
            }
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during patch application".to_string()
    }
}
