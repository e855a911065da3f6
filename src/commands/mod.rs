// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod agreements;
pub mod companies;
pub mod doctor;
pub mod exporter;
pub mod importer;
pub mod payments;
pub mod settings;
pub mod sites;
pub mod transactions;
