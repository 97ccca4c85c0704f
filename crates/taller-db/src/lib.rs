// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use taller_app::{
    Cliente, ClienteId, EstadoOt, NivelCombustible, OrdenId, OrdenTrabajo, ShopContext,
    TipoDocumento, Vehiculo, VehiculoId,
};
use taller_testkit::ShopFaker;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

pub const APP_NAME: &str = "taller";

const DEMO_SEED: u64 = 2026;
const DEMO_CLIENTES: usize = 12;
const DEMO_ORDENES: usize = 30;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "clientes",
        &[
            "id",
            "nombre",
            "tipo_doc",
            "numero_doc",
            "telefono",
            "email",
            "direccion",
            "fecha_registro",
            "consentimiento_comunicaciones",
            "created_at",
        ],
    ),
    (
        "vehiculos",
        &[
            "id",
            "cliente_id",
            "marca",
            "linea_modelo",
            "placa",
            "anio",
            "color",
            "created_at",
        ],
    ),
    (
        "ordenes_trabajo",
        &[
            "id",
            "vehiculo_id",
            "fecha_ingreso",
            "odometro_ingreso",
            "nivel_combustible",
            "fecha_estimada_entrega",
            "observaciones",
            "estado",
            "created_at",
            "updated_at",
        ],
    ),
    ("orden_fotos", &["id", "orden_id", "position", "url"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_vehiculos_cliente_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_vehiculos_cliente_id ON vehiculos (cliente_id);",
    },
    RequiredIndex {
        name: "idx_vehiculos_placa",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_vehiculos_placa ON vehiculos (placa);",
    },
    RequiredIndex {
        name: "idx_ordenes_trabajo_vehiculo_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_ordenes_trabajo_vehiculo_id ON ordenes_trabajo (vehiculo_id);",
    },
    RequiredIndex {
        name: "idx_ordenes_trabajo_estado",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_ordenes_trabajo_estado ON ordenes_trabajo (estado);",
    },
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("database schema created");
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    /// Fills an empty database with a deterministic demo shop.
    pub fn seed_demo_data(&self) -> Result<()> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clientes", [], |row| row.get(0))
            .context("count clients before seeding")?;
        if existing > 0 {
            bail!("database already has {existing} client(s); demo data needs an empty database");
        }

        let shop = ShopFaker::new(DEMO_SEED).shop(DEMO_CLIENTES, DEMO_ORDENES);
        for cliente in &shop.clientes {
            self.create_cliente(cliente)?;
        }
        for vehiculo in &shop.vehiculos {
            self.create_vehiculo(vehiculo)?;
        }
        for orden in &shop.ordenes {
            self.create_orden(orden)?;
        }
        info!(
            clientes = shop.clientes.len(),
            vehiculos = shop.vehiculos.len(),
            ordenes = shop.ordenes.len(),
            "demo data seeded"
        );
        Ok(())
    }

    pub fn load_context(&self) -> Result<ShopContext> {
        Ok(ShopContext::new(
            self.list_clientes()?,
            self.list_vehiculos()?,
            self.list_ordenes()?,
        ))
    }

    pub fn list_clientes(&self) -> Result<Vec<Cliente>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, nombre, tipo_doc, numero_doc, telefono, email, direccion,
                  fecha_registro, consentimiento_comunicaciones
                FROM clientes
                ORDER BY rowid ASC
                ",
            )
            .context("prepare clientes query")?;
        let rows = stmt
            .query_map([], |row| {
                let tipo_doc_raw: String = row.get(2)?;
                let tipo_doc = TipoDocumento::parse(&tipo_doc_raw).ok_or_else(|| {
                    invalid_text(2, format!("unknown document type {tipo_doc_raw}"))
                })?;
                let fecha_registro_raw: String = row.get(7)?;

                Ok(Cliente {
                    id: ClienteId::new(row.get::<_, String>(0)?),
                    nombre: row.get(1)?,
                    tipo_doc,
                    numero_doc: row.get(3)?,
                    telefono: row.get(4)?,
                    email: row.get(5)?,
                    direccion: row.get(6)?,
                    fecha_registro: parse_date(&fecha_registro_raw).map_err(to_sql_error)?,
                    consentimiento_comunicaciones: row.get(8)?,
                })
            })
            .context("query clientes")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect clientes")
    }

    pub fn create_cliente(&self, cliente: &Cliente) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO clientes (
                  id, nombre, tipo_doc, numero_doc, telefono, email, direccion,
                  fecha_registro, consentimiento_comunicaciones, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    cliente.id.as_str(),
                    cliente.nombre,
                    cliente.tipo_doc.as_str(),
                    cliente.numero_doc,
                    cliente.telefono,
                    cliente.email,
                    cliente.direccion,
                    format_date(cliente.fecha_registro),
                    cliente.consentimiento_comunicaciones,
                    now,
                ],
            )
            .with_context(|| format!("insert client {}", cliente.id))?;
        debug!(cliente = %cliente.id, "client stored");
        Ok(())
    }

    pub fn list_vehiculos(&self) -> Result<Vec<Vehiculo>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, cliente_id, marca, linea_modelo, placa, anio, color
                FROM vehiculos
                ORDER BY rowid ASC
                ",
            )
            .context("prepare vehiculos query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Vehiculo {
                    id: VehiculoId::new(row.get::<_, String>(0)?),
                    cliente_id: ClienteId::new(row.get::<_, String>(1)?),
                    marca: row.get(2)?,
                    linea_modelo: row.get(3)?,
                    placa: row.get(4)?,
                    anio: row.get(5)?,
                    color: row.get(6)?,
                })
            })
            .context("query vehiculos")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect vehiculos")
    }

    pub fn create_vehiculo(&self, vehiculo: &Vehiculo) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO vehiculos (
                  id, cliente_id, marca, linea_modelo, placa, anio, color, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    vehiculo.id.as_str(),
                    vehiculo.cliente_id.as_str(),
                    vehiculo.marca,
                    vehiculo.linea_modelo,
                    vehiculo.placa,
                    vehiculo.anio,
                    vehiculo.color,
                    now,
                ],
            )
            .with_context(|| {
                format!(
                    "insert vehicle {} (plate {} must be unique and client {} must exist)",
                    vehiculo.id, vehiculo.placa, vehiculo.cliente_id
                )
            })?;
        debug!(vehiculo = %vehiculo.id, "vehicle stored");
        Ok(())
    }

    pub fn list_ordenes(&self) -> Result<Vec<OrdenTrabajo>> {
        let mut fotos = self.list_fotos()?;
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, vehiculo_id, fecha_ingreso, odometro_ingreso, nivel_combustible,
                  fecha_estimada_entrega, observaciones, estado
                FROM ordenes_trabajo
                ORDER BY rowid ASC
                ",
            )
            .context("prepare ordenes query")?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let nivel_raw: String = row.get(4)?;
                let nivel_combustible = NivelCombustible::parse(&nivel_raw)
                    .ok_or_else(|| invalid_text(4, format!("unknown fuel level {nivel_raw}")))?;
                let estado_raw: String = row.get(7)?;
                let estado = EstadoOt::parse(&estado_raw).ok_or_else(|| {
                    invalid_text(7, format!("unknown order status {estado_raw}"))
                })?;
                let fecha_ingreso_raw: String = row.get(2)?;
                let entrega_raw: Option<String> = row.get(5)?;

                Ok(OrdenTrabajo {
                    fotos_url: fotos.remove(&id).unwrap_or_default(),
                    id: OrdenId::new(id),
                    vehiculo_id: VehiculoId::new(row.get::<_, String>(1)?),
                    fecha_ingreso: parse_date(&fecha_ingreso_raw).map_err(to_sql_error)?,
                    odometro_ingreso: row.get(3)?,
                    nivel_combustible,
                    fecha_estimada_entrega: parse_opt_date(entrega_raw).map_err(to_sql_error)?,
                    observaciones: row.get(6)?,
                    estado,
                })
            })
            .context("query ordenes")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect ordenes")
    }

    pub fn create_orden(&self, orden: &OrdenTrabajo) -> Result<()> {
        let now = now_rfc3339()?;
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin order transaction")?;
        tx.execute(
            "
            INSERT INTO ordenes_trabajo (
              id, vehiculo_id, fecha_ingreso, odometro_ingreso, nivel_combustible,
              fecha_estimada_entrega, observaciones, estado, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                orden.id.as_str(),
                orden.vehiculo_id.as_str(),
                format_date(orden.fecha_ingreso),
                orden.odometro_ingreso,
                orden.nivel_combustible.as_str(),
                orden.fecha_estimada_entrega.map(format_date),
                orden.observaciones,
                orden.estado.as_str(),
                now,
                now,
            ],
        )
        .with_context(|| format!("insert order {}", orden.id))?;

        for (position, url) in orden.fotos_url.iter().enumerate() {
            tx.execute(
                "INSERT INTO orden_fotos (orden_id, position, url) VALUES (?, ?, ?)",
                params![orden.id.as_str(), position as i64, url],
            )
            .with_context(|| format!("insert photo {position} for order {}", orden.id))?;
        }
        tx.commit()
            .with_context(|| format!("commit order {}", orden.id))?;
        debug!(orden = %orden.id, fotos = orden.fotos_url.len(), "order stored");
        Ok(())
    }

    pub fn update_orden_estado(&self, id: &OrdenId, estado: EstadoOt) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE ordenes_trabajo SET estado = ?, updated_at = ? WHERE id = ?",
                params![estado.as_str(), now, id.as_str()],
            )
            .with_context(|| format!("update status of order {id}"))?;
        if rows_affected == 0 {
            bail!("order {id} not found -- reload and retry");
        }
        debug!(orden = %id, estado = estado.as_str(), "order status stored");
        Ok(())
    }

    pub fn get_orden_estado(&self, id: &OrdenId) -> Result<Option<EstadoOt>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT estado FROM ordenes_trabajo WHERE id = ?",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("load status of order {id}"))?;
        raw.map(|value| {
            EstadoOt::parse(&value)
                .ok_or_else(|| anyhow!("order {id} has unknown status {value:?} in the database"))
        })
        .transpose()
    }

    fn list_fotos(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT orden_id, url FROM orden_fotos ORDER BY orden_id ASC, position ASC")
            .context("prepare photos query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .context("query photos")?;

        let mut fotos: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let (orden_id, url) = row.context("read photo row")?;
            fotos.entry(orden_id).or_default().push(url);
        }
        Ok(fotos)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TALLER_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TALLER_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("taller.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point TALLER_DB_PATH at a taller database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("unsupported date format {raw:?}"))
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn invalid_text(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_text(0, format!("{error:#}"))
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{Store, parse_date};
    use anyhow::Result;
    use taller_app::{EstadoOt, OrdenId};

    #[test]
    fn parse_date_rejects_day_first_text() {
        assert!(parse_date("2026-01-31").is_ok());
        assert!(parse_date("31/01/2026").is_err());
    }

    #[test]
    fn missing_order_status_is_none() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        assert_eq!(store.get_orden_estado(&OrdenId::new("OT-0001"))?, None);
        Ok(())
    }

    #[test]
    fn demo_seed_populates_and_refuses_to_repeat() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.seed_demo_data()?;

        let ctx = store.load_context()?;
        assert_eq!(ctx.clientes().len(), 12);
        assert_eq!(ctx.ordenes().len(), 30);
        assert!(ctx.ordenes().iter().all(|orden| EstadoOt::ALL.contains(&orden.estado)));

        let error = store.seed_demo_data().expect_err("second seed should fail");
        assert!(error.to_string().contains("empty database"));
        Ok(())
    }
}
