/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */


pub mod assembly;
pub mod expiry;
pub mod github;
pub mod orchestrator;
pub mod scheduler;
pub mod watchdog;

use appcore::types::ServerState;
use std::sync::Arc;

pub async fn start_builder(state: Arc<ServerState>) -> std::io::Result<()> {
    tokio::spawn(scheduler::schedule_build_loop(Arc::clone(&state)));
    tokio::spawn(expiry::expiry_loop(Arc::clone(&state)));
    Ok(())
}
