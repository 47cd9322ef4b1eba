// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Process-wide policy driven by the C server.
//!
//! Active node changes are collected while the policy lock is held and the
//! observer callback runs after it is released, so the callback may call
//! back into these functions.

use std::ffi::c_char;
use std::ffi::CString;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;
use std::sync::PoisonError;

use crate::ActiveNodeObserver;
use crate::AudioDeviceType;
use crate::AudioNode;
use crate::DeviceSelectionPolicy;
use crate::Direction;
use crate::Error;
use crate::NodeId;

/// Called with `(is_input, node_id, has_active)`. `node_id` is 0 when
/// `has_active` is false.
pub type ActiveNodeChangedCallback = extern "C" fn(bool, u64, bool);

#[derive(Default)]
struct CallbackObserver {
    callback: Option<ActiveNodeChangedCallback>,
    pending: Vec<(Direction, Option<NodeId>)>,
}

impl ActiveNodeObserver for CallbackObserver {
    fn active_node_changed(&mut self, direction: Direction, node_id: Option<NodeId>) {
        if self.callback.is_some() {
            self.pending.push((direction, node_id));
        }
    }
}

fn state() -> MutexGuard<'static, DeviceSelectionPolicy<CallbackObserver>> {
    static CELL: OnceLock<Mutex<DeviceSelectionPolicy<CallbackObserver>>> = OnceLock::new();
    CELL.get_or_init(|| Mutex::new(DeviceSelectionPolicy::new(CallbackObserver::default())))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

// Runs `f` on the policy, then reports the changes it made with the lock
// released.
fn with_state<R>(f: impl FnOnce(&mut DeviceSelectionPolicy<CallbackObserver>) -> R) -> R {
    let (ret, callback, changes) = {
        let mut state = state();
        let ret = f(&mut state);
        let observer = state.observer_mut();
        (ret, observer.callback, std::mem::take(&mut observer.pending))
    };
    if let Some(callback) = callback {
        for (direction, node_id) in changes {
            callback(
                direction.is_input(),
                node_id.map_or(0, |id| id.0),
                node_id.is_some(),
            );
        }
    }
    ret
}

fn errno(err: &Error) -> libc::c_int {
    match err {
        Error::DuplicateNode(_) => -libc::EEXIST,
        Error::UnknownDeviceType(_) => -libc::EINVAL,
        Error::UnknownNode(_) => -libc::ENOENT,
    }
}

fn to_return_code<T>(op: &str, result: crate::Result<T>) -> libc::c_int {
    match result {
        Ok(_) => 0,
        Err(err) => {
            log::error!("cras_device_selection {op} failed: {err}");
            errno(&err)
        }
    }
}

/// Set the function called when an active node changes.
/// Pass NULL to stop notifications.
/// The callback runs after the policy lock is released and may call the
/// other cras_device_selection functions.
#[no_mangle]
pub extern "C" fn cras_device_selection_set_observer(callback: Option<ActiveNodeChangedCallback>) {
    let mut state = state();
    let observer = state.observer_mut();
    observer.callback = callback;
    observer.pending.clear();
}

/// Plug a node and make it active.
/// Returns 0 on success, -EEXIST if the node is already plugged or -EINVAL
/// if `device_type` is unknown.
#[no_mangle]
pub extern "C" fn cras_device_selection_plug(
    node_id: u64,
    is_input: bool,
    device_type: u32,
    plugged_time: u64,
) -> libc::c_int {
    let result = AudioDeviceType::try_from(device_type).and_then(|device_type| {
        with_state(|state| {
            state.plug(AudioNode::new(
                NodeId(node_id),
                is_input,
                device_type,
                plugged_time,
            ))
        })
    });
    to_return_code("plug", result)
}

/// Unplug a node. Returns 0 on success or -ENOENT if it is not plugged.
#[no_mangle]
pub extern "C" fn cras_device_selection_unplug(node_id: u64) -> libc::c_int {
    let result = with_state(|state| state.unplug(NodeId(node_id)));
    to_return_code("unplug", result)
}

/// Make a plugged node active. Returns 0 on success or -ENOENT if it is not
/// plugged.
#[no_mangle]
pub extern "C" fn cras_device_selection_select(node_id: u64) -> libc::c_int {
    let result = with_state(|state| state.select(NodeId(node_id)));
    to_return_code("select", result)
}

/// Returns whether the direction has an active node and stores its id in
/// `node_id`.
///
/// # Safety
///
/// `node_id` must be NULL or point to writable memory for a u64.
#[no_mangle]
pub unsafe extern "C" fn cras_device_selection_get_active_node(
    is_input: bool,
    node_id: *mut u64,
) -> bool {
    let Some(active) = state().active_node(Direction::from_is_input(is_input)) else {
        return false;
    };
    if !node_id.is_null() {
        *node_id = active.0;
    }
    true
}

/// Unplug every node.
#[no_mangle]
pub extern "C" fn cras_device_selection_reset() {
    with_state(|state| state.clear());
}

/// Dump the policy state as JSON.
/// The returned string should be freed with cras_device_selection_free_string.
/// Returns NULL on failure.
#[no_mangle]
pub extern "C" fn cras_device_selection_dump_json() -> *mut c_char {
    let json = match state().dump_json() {
        Ok(json) => json,
        Err(err) => {
            log::error!("cannot dump device selection state: {err}");
            return std::ptr::null_mut();
        }
    };
    match CString::new(json) {
        Ok(s) => s.into_raw(),
        Err(err) => {
            log::error!("device selection dump is not a C string: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string returned by cras_device_selection_dump_json.
///
/// # Safety
///
/// `s` must be NULL or a string returned by cras_device_selection_dump_json
/// that was not freed yet.
#[no_mangle]
pub unsafe extern "C" fn cras_device_selection_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
}
