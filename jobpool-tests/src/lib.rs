// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod gate;
pub mod scenarios;
pub mod test_log;
