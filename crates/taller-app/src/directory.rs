// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::format::{consent_label, format_date};
use crate::lookup::ClientLookup;
use crate::{Cliente, ShopContext, Vehiculo};

/// Name and email match case-insensitively; the document number must match as typed.
pub fn cliente_matches(cliente: &Cliente, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    cliente.nombre.to_lowercase().contains(&needle)
        || cliente.numero_doc.contains(search)
        || cliente
            .email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(&needle))
}

pub fn vehiculo_matches(vehiculo: &Vehiculo, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [&vehiculo.placa, &vehiculo.marca, &vehiculo.linea_modelo]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn filter_clientes<'a>(clientes: &'a [Cliente], search: &str) -> Vec<&'a Cliente> {
    clientes
        .iter()
        .filter(|cliente| cliente_matches(cliente, search))
        .collect()
}

pub fn filter_vehiculos<'a>(vehiculos: &'a [Vehiculo], search: &str) -> Vec<&'a Vehiculo> {
    vehiculos
        .iter()
        .filter(|vehiculo| vehiculo_matches(vehiculo, search))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Clientes,
    Vehiculos,
}

/// Message for an empty directory list, split on whether a search is active.
pub fn directory_empty_message(kind: DirectoryKind, searching: bool) -> &'static str {
    match (kind, searching) {
        (DirectoryKind::Clientes, false) => "No hay clientes registrados",
        (DirectoryKind::Clientes, true) => "No se encontraron clientes",
        (DirectoryKind::Vehiculos, false) => "No hay vehículos registrados",
        (DirectoryKind::Vehiculos, true) => "No se encontraron vehículos",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClienteRow {
    pub id: String,
    pub nombre: String,
    pub documento: String,
    pub telefono: String,
    pub email: String,
    pub registro: String,
    pub comunicaciones: &'static str,
    pub vehiculos: usize,
}

impl ClienteRow {
    pub fn build(cliente: &Cliente, ctx: &ShopContext) -> Self {
        Self {
            id: cliente.id.to_string(),
            nombre: cliente.nombre.clone(),
            documento: format!("{} {}", cliente.tipo_doc.as_str(), cliente.numero_doc),
            telefono: cliente.telefono.clone(),
            email: cliente.email.clone().unwrap_or_default(),
            registro: format_date(cliente.fecha_registro),
            comunicaciones: consent_label(cliente.consentimiento_comunicaciones),
            vehiculos: ctx
                .vehiculos()
                .iter()
                .filter(|vehiculo| vehiculo.cliente_id == cliente.id)
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehiculoRow {
    pub id: String,
    pub placa: String,
    pub marca: String,
    pub linea_modelo: String,
    pub anio: String,
    pub color: String,
    pub propietario: String,
    pub ordenes: usize,
}

impl VehiculoRow {
    pub fn build(vehiculo: &Vehiculo, ctx: &ShopContext) -> Self {
        Self {
            id: vehiculo.id.to_string(),
            placa: vehiculo.placa.clone(),
            marca: vehiculo.marca.clone(),
            linea_modelo: vehiculo.linea_modelo.clone(),
            anio: vehiculo.anio.map(|anio| anio.to_string()).unwrap_or_default(),
            color: vehiculo.color.clone().unwrap_or_default(),
            propietario: ClientLookup::resolve(ctx.clientes(), &vehiculo.cliente_id)
                .display_name()
                .to_owned(),
            ordenes: ctx
                .ordenes()
                .iter()
                .filter(|orden| orden.vehiculo_id == vehiculo.id)
                .count(),
        }
    }
}

/// Search text for the client or vehicle list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
    kind: DirectoryKind,
    search: String,
}

impl DirectoryView {
    pub fn new(kind: DirectoryKind) -> Self {
        Self {
            kind,
            search: String::new(),
        }
    }

    pub fn kind(&self) -> DirectoryKind {
        self.kind
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn push_search_char(&mut self, value: char) {
        self.search.push(value);
    }

    pub fn pop_search_char(&mut self) -> Option<char> {
        self.search.pop()
    }

    pub fn cliente_rows(&self, ctx: &ShopContext) -> Vec<ClienteRow> {
        filter_clientes(ctx.clientes(), &self.search)
            .into_iter()
            .map(|cliente| ClienteRow::build(cliente, ctx))
            .collect()
    }

    pub fn vehiculo_rows(&self, ctx: &ShopContext) -> Vec<VehiculoRow> {
        filter_vehiculos(ctx.vehiculos(), &self.search)
            .into_iter()
            .map(|vehiculo| VehiculoRow::build(vehiculo, ctx))
            .collect()
    }

    pub fn visible_len(&self, ctx: &ShopContext) -> usize {
        match self.kind {
            DirectoryKind::Clientes => filter_clientes(ctx.clientes(), &self.search).len(),
            DirectoryKind::Vehiculos => filter_vehiculos(ctx.vehiculos(), &self.search).len(),
        }
    }

    pub fn empty_message(&self, visible_len: usize) -> Option<&'static str> {
        (visible_len == 0).then(|| directory_empty_message(self.kind, !self.search.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DirectoryKind, DirectoryView, cliente_matches, filter_clientes, filter_vehiculos,
    };
    use crate::{Cliente, ClienteId, ShopContext, TipoDocumento, Vehiculo, VehiculoId};
    use time::{Date, Month};

    fn cliente(id: &str, nombre: &str, doc: &str, email: Option<&str>) -> Cliente {
        Cliente {
            id: ClienteId::new(id),
            nombre: nombre.to_owned(),
            tipo_doc: TipoDocumento::Nit,
            numero_doc: doc.to_owned(),
            telefono: "604 444 5555".to_owned(),
            email: email.map(str::to_owned),
            direccion: None,
            fecha_registro: Date::from_calendar_date(2025, Month::August, 20).expect("valid date"),
            consentimiento_comunicaciones: true,
        }
    }

    fn vehiculo(id: &str, owner: &str, marca: &str, placa: &str) -> Vehiculo {
        Vehiculo {
            id: VehiculoId::new(id),
            cliente_id: ClienteId::new(owner),
            marca: marca.to_owned(),
            linea_modelo: "MT-03".to_owned(),
            placa: placa.to_owned(),
            anio: Some(2023),
            color: Some("Azul".to_owned()),
        }
    }

    #[test]
    fn client_search_fields_have_distinct_case_rules() {
        let moto = cliente("CLI-1", "MotoRepuestos SAS", "900123-Ab", Some("Ventas@Moto.co"));
        assert!(cliente_matches(&moto, "motorep"));
        assert!(cliente_matches(&moto, "ventas@moto"));
        assert!(cliente_matches(&moto, "123-Ab"));
        assert!(!cliente_matches(&moto, "123-ab"));
        assert!(cliente_matches(&moto, ""));

        let sin_email = cliente("CLI-2", "Pedro", "71", None);
        assert!(!cliente_matches(&sin_email, "@"));
    }

    #[test]
    fn filters_keep_insertion_order() {
        let clientes = vec![
            cliente("CLI-1", "Beatriz", "1", None),
            cliente("CLI-2", "Alberto", "2", None),
            cliente("CLI-3", "Bernardo", "3", None),
        ];
        let names: Vec<_> = filter_clientes(&clientes, "b")
            .iter()
            .map(|cliente| cliente.nombre.as_str())
            .collect();
        assert_eq!(names, vec!["Beatriz", "Alberto", "Bernardo"]);

        let vehiculos = vec![
            vehiculo("VEH-1", "CLI-1", "Yamaha", "KLM90A"),
            vehiculo("VEH-2", "CLI-1", "KTM", "ZZZ11Z"),
        ];
        assert_eq!(filter_vehiculos(&vehiculos, "klm").len(), 1);
        assert_eq!(filter_vehiculos(&vehiculos, "ktm")[0].id.as_str(), "VEH-2");
        assert_eq!(filter_vehiculos(&vehiculos, "mt-03").len(), 2);
    }

    #[test]
    fn empty_messages_follow_search() {
        let ctx = ShopContext::default();
        let mut view = DirectoryView::new(DirectoryKind::Clientes);
        assert_eq!(view.empty_message(view.visible_len(&ctx)), Some("No hay clientes registrados"));
        view.set_search("zz");
        assert_eq!(view.empty_message(0), Some("No se encontraron clientes"));
        assert_eq!(view.empty_message(2), None);
    }

    #[test]
    fn vehicle_rows_use_owner_placeholder() {
        let ctx = ShopContext::new(
            vec![cliente("CLI-1", "Rosa", "9", None)],
            vec![
                vehiculo("VEH-1", "CLI-1", "Honda", "AAA00A"),
                vehiculo("VEH-2", "CLI-9", "Honda", "BBB00B"),
            ],
            Vec::new(),
        );
        let rows = DirectoryView::new(DirectoryKind::Vehiculos).vehiculo_rows(&ctx);
        assert_eq!(rows[0].propietario, "Rosa");
        assert_eq!(rows[1].propietario, "Cliente no encontrado");
        assert_eq!(rows[0].anio, "2023");

        let clientes = DirectoryView::new(DirectoryKind::Clientes).cliente_rows(&ctx);
        assert_eq!(clientes[0].vehiculos, 1);
        assert_eq!(clientes[0].documento, "NIT 9");
        assert_eq!(clientes[0].comunicaciones, "Acepta comunicaciones");
        assert_eq!(clientes[0].registro, "20/08/2025");
    }
}
