// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EstadoOt, OrdenId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("order id is empty -- select an order and retry")]
    EmptyOrderId,
    #[error("order {0} not found -- refresh the list and retry")]
    OrderNotFound(OrdenId),
    #[error("order {id} cannot move from {} to {}", .from.label(), .to.label())]
    TransitionNotAllowed {
        id: OrdenId,
        from: EstadoOt,
        to: EstadoOt,
    },
    #[error("no status change is available from {}", .0.label())]
    NoTransitions(EstadoOt),
}

/// Which status changes the status-change modal offers and the context accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Open,
    /// Orders follow the shop's intake-to-close lifecycle.
    Lifecycle,
}

impl TransitionPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Lifecycle => "lifecycle",
        }
    }

    /// Statuses reachable from `current`, in dashboard order, never including `current`.
    pub fn targets(self, current: EstadoOt) -> Vec<EstadoOt> {
        match self {
            Self::Open => EstadoOt::ALL
                .into_iter()
                .filter(|estado| *estado != current)
                .collect(),
            Self::Lifecycle => lifecycle_targets(current).to_vec(),
        }
    }

    pub fn allows(self, from: EstadoOt, to: EstadoOt) -> bool {
        from == to || self.targets(from).contains(&to)
    }

    pub fn check(self, id: &OrdenId, from: EstadoOt, to: EstadoOt) -> Result<(), WorkflowError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(WorkflowError::TransitionNotAllowed {
                id: id.clone(),
                from,
                to,
            })
        }
    }
}

fn lifecycle_targets(current: EstadoOt) -> &'static [EstadoOt] {
    match current {
        EstadoOt::Recepcion => &[EstadoOt::Diagnostico],
        EstadoOt::Diagnostico => &[EstadoOt::Cotizado],
        // A rejected quote closes the order without work.
        EstadoOt::Cotizado => &[EstadoOt::Aprobado, EstadoOt::Cerrado],
        EstadoOt::Aprobado => &[EstadoOt::EnProceso],
        EstadoOt::EnProceso => &[EstadoOt::Pruebas, EstadoOt::Listo],
        EstadoOt::Pruebas => &[EstadoOt::EnProceso, EstadoOt::Listo],
        EstadoOt::Listo => &[EstadoOt::Entregado],
        EstadoOt::Entregado => &[EstadoOt::Cerrado],
        EstadoOt::Cerrado => &[],
    }
}
