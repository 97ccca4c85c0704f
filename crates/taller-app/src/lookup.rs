// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Cliente, ClienteId, Vehiculo, VehiculoId};

pub const VEHICULO_NO_ENCONTRADO: &str = "Vehículo no encontrado";
pub const CLIENTE_NO_ENCONTRADO: &str = "Cliente no encontrado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLookup<'a> {
    Found(&'a Cliente),
    Missing,
}

impl<'a> ClientLookup<'a> {
    pub fn resolve(clientes: &'a [Cliente], id: &ClienteId) -> Self {
        clientes
            .iter()
            .find(|cliente| &cliente.id == id)
            .map_or(Self::Missing, Self::Found)
    }

    pub fn found(self) -> Option<&'a Cliente> {
        match self {
            Self::Found(cliente) => Some(cliente),
            Self::Missing => None,
        }
    }

    pub fn display_name(self) -> &'a str {
        match self {
            Self::Found(cliente) => &cliente.nombre,
            Self::Missing => CLIENTE_NO_ENCONTRADO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleLookup<'a> {
    Found {
        vehiculo: &'a Vehiculo,
        cliente: ClientLookup<'a>,
    },
    Missing,
}

impl<'a> VehicleLookup<'a> {
    pub fn resolve(vehiculos: &'a [Vehiculo], clientes: &'a [Cliente], id: &VehiculoId) -> Self {
        match vehiculos.iter().find(|vehiculo| &vehiculo.id == id) {
            Some(vehiculo) => Self::Found {
                vehiculo,
                cliente: ClientLookup::resolve(clientes, &vehiculo.cliente_id),
            },
            None => Self::Missing,
        }
    }

    pub fn vehiculo(self) -> Option<&'a Vehiculo> {
        match self {
            Self::Found { vehiculo, .. } => Some(vehiculo),
            Self::Missing => None,
        }
    }

    /// `marca línea - placa`, or the fixed placeholder.
    pub fn vehicle_line(self) -> String {
        match self {
            Self::Found { vehiculo, .. } => vehiculo.display_line(),
            Self::Missing => VEHICULO_NO_ENCONTRADO.to_owned(),
        }
    }

    /// Client name for the card; `None` when the vehicle itself is missing,
    /// since the placeholder line replaces all vehicle details.
    pub fn client_name(self) -> Option<&'a str> {
        match self {
            Self::Found { cliente, .. } => Some(cliente.display_name()),
            Self::Missing => None,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(
            self,
            Self::Found {
                cliente: ClientLookup::Found(_),
                ..
            }
        )
    }
}
