//! Assembles a sector's flat meter records into a rooted tree.
//!
//! Root resolution prefers an explicit per-sector override from the
//! configuration; otherwise the sector's generator-with-no-parent is used.
//! When neither resolves, the sector's analysis aborts with
//! [`DwaError::RootNotFound`].
//!
//! Children are attached regardless of their own sector id: the data model
//! permits cross-sector attachment, so those rows stay in the tree and are
//! surfaced as topology warnings instead of being filtered out. Disallowed
//! child kinds are likewise warnings by default; with
//! `AnalysisConfig::strict_child_kinds` set the build rejects them with
//! [`DwaError::InvalidChild`].
//!
//! Traversal is an explicit work stack; a meter id seen twice means the
//! parent/child foreign keys close a cycle, which aborts the whole build
//! for the sector with [`DwaError::StructuralCycle`].

use dwa_core::{
    AnalysisConfig, Diagnostics, DwaError, DwaResult, MeterHierarchy, MeterKind, MeterStore,
    SectorId,
};

/// A built hierarchy plus the non-fatal observations made along the way.
#[derive(Debug)]
pub struct BuildOutcome {
    pub hierarchy: MeterHierarchy,
    pub diagnostics: Diagnostics,
}

/// Build the metering tree for one sector from the store snapshot.
pub fn build<S: MeterStore + ?Sized>(
    store: &S,
    sector: SectorId,
    config: &AnalysisConfig,
) -> DwaResult<BuildOutcome> {
    let mut diagnostics = Diagnostics::new();

    let root = match config.root_overrides.get(&sector) {
        Some(&override_id) => store
            .record(override_id)?
            .ok_or(DwaError::RootNotFound(sector))?,
        None => store
            .root_for_sector(sector)?
            .ok_or(DwaError::RootNotFound(sector))?,
    };

    if root.kind != MeterKind::Generator {
        diagnostics.warn_entity(
            "topology",
            &format!("root meter is a {}, not a generator", root.kind),
            &format!("Meter {}", root.id),
        );
    }

    let mut hierarchy = MeterHierarchy::new(root);
    let mut work = vec![hierarchy.root()];

    while let Some(parent_idx) = work.pop() {
        let (parent_id, parent_kind, parent_sector) = {
            let node = hierarchy.node(parent_idx);
            (node.record.id, node.record.kind, node.record.sector)
        };

        for child in store.children_of(parent_id)? {
            if !parent_kind.allows_child(child.kind) {
                if config.strict_child_kinds {
                    return Err(DwaError::InvalidChild {
                        parent: parent_id,
                        parent_kind,
                        child: child.id,
                        child_kind: child.kind,
                    });
                }
                diagnostics.warn_entity(
                    "kind",
                    &format!(
                        "{} is not an allowed child of {} (Meter {})",
                        child.kind, parent_kind, parent_id
                    ),
                    &format!("Meter {}", child.id),
                );
            }
            if child.sector != parent_sector {
                diagnostics.warn_entity(
                    "topology",
                    &format!(
                        "child belongs to sector {}, tree is sector {}",
                        child.sector, parent_sector
                    ),
                    &format!("Meter {}", child.id),
                );
            }
            if child.withdrawal_kwh.is_none() {
                diagnostics.warn_entity(
                    "reading",
                    "withdrawal missing, treated as 0.0 kWh",
                    &format!("Meter {}", child.id),
                );
            }

            let child_idx = hierarchy.attach(parent_idx, child)?;
            work.push(child_idx);
        }
    }

    Ok(BuildOutcome {
        hierarchy,
        diagnostics,
    })
}
