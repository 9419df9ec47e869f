/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debug-build enforcement of the player's lock ordering.
//!
//! The object lock may be acquired while the input lock is held, never
//! the reverse: input teardown joins the pipeline thread, and that thread
//! runs translation callbacks which take the object lock.

use std::cell::Cell;

thread_local! {
    static OBJECT_LOCK_DEPTH: Cell<usize> = Cell::new(0);
}

/// Marks the object lock as held on this thread for the token's
/// lifetime.
pub(crate) struct ObjectLockToken(());

impl ObjectLockToken {
    pub(crate) fn acquire() -> ObjectLockToken {
        OBJECT_LOCK_DEPTH.with(|depth| depth.set(depth.get() + 1));
        ObjectLockToken(())
    }
}

impl Drop for ObjectLockToken {
    fn drop(&mut self) {
        OBJECT_LOCK_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Call before acquiring the input lock.
pub(crate) fn assert_input_lock_allowed() {
    debug_assert!(
        OBJECT_LOCK_DEPTH.with(|depth| depth.get()) == 0,
        "input lock acquired while holding the object lock"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_balances_the_depth_counter() {
        {
            let _outer = ObjectLockToken::acquire();
            let _inner = ObjectLockToken::acquire();
        }
        assert_input_lock_allowed();
    }

    #[test]
    #[should_panic(expected = "input lock acquired while holding the object lock")]
    #[cfg(debug_assertions)]
    fn inverted_order_panics_in_debug_builds() {
        let _token = ObjectLockToken::acquire();
        assert_input_lock_allowed();
    }
}
