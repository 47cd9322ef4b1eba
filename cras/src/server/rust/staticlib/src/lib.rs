// Copyright 2023 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

// Exports the cras_device_selection C functions from a staticlib.
pub use cras_device_selection;
