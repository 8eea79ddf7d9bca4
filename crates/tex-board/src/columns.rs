//! Column Projector
//!
//! Each role has its own board: an ordered list of columns, each owning a set
//! of canonical statuses. The column sets must partition every status the
//! role can observe, exhaustively and disjointly; [`check_partition`]
//! verifies that and the tests assert it for both roles.
//!
//! Projection never drops an order. A status outside every column is a
//! table defect: it trips a `debug_assert!`, is logged at `error!`, and the
//! order is kept in [`BoardProjection::unmapped`].

use std::fmt;

use tex_orders::Order;
use tex_status::{reachable_statuses, CanonicalStatus, Role};
use tracing::error;

use CanonicalStatus::*;

pub type ColumnId = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColumn {
    pub id: ColumnId,
    pub label: &'static str,
    pub statuses: &'static [CanonicalStatus],
}

impl StatusColumn {
    pub fn contains(&self, status: CanonicalStatus) -> bool {
        self.statuses.contains(&status)
    }
}

static BRAND_COLUMNS: &[StatusColumn] = &[
    StatusColumn {
        id: "novos",
        label: "Novos Pedidos",
        statuses: &[New],
    },
    StatusColumn {
        id: "negociacao",
        label: "Em Negociação",
        statuses: &[Negotiating],
    },
    StatusColumn {
        id: "andamento",
        label: "Em Andamento",
        statuses: &[Accepted, Waiting, Production],
    },
    StatusColumn {
        id: "envio",
        label: "Pronto para Envio",
        statuses: &[ReadySend],
    },
    StatusColumn {
        id: "concluidos",
        label: "Concluídos",
        statuses: &[Finalized],
    },
    StatusColumn {
        id: "encerrados",
        label: "Recusados / Cancelados",
        statuses: &[Rejected, Cancelled],
    },
];

static SUPPLIER_COLUMNS: &[StatusColumn] = &[
    StatusColumn {
        id: "solicitacoes",
        label: "Solicitações",
        statuses: &[New, Negotiating],
    },
    StatusColumn {
        id: "aguardando",
        label: "Aguardando Insumos",
        statuses: &[Accepted, Waiting],
    },
    StatusColumn {
        id: "producao",
        label: "Em Produção",
        statuses: &[Production],
    },
    StatusColumn {
        id: "envio",
        label: "Pronto para Envio",
        statuses: &[ReadySend],
    },
    StatusColumn {
        id: "finalizados",
        label: "Finalizados",
        statuses: &[Finalized],
    },
    StatusColumn {
        id: "recusados",
        label: "Recusados / Cancelados",
        statuses: &[Rejected, Cancelled],
    },
];

/// Board columns for `role`, in display order.
pub fn columns_for(role: Role) -> &'static [StatusColumn] {
    match role {
        Role::Brand => BRAND_COLUMNS,
        Role::Supplier => SUPPLIER_COLUMNS,
    }
}

/// The column holding `status` on `role`'s board.
pub fn column_for(status: CanonicalStatus, role: Role) -> Option<&'static StatusColumn> {
    columns_for(role).iter().find(|c| c.contains(status))
}

// ---------------------------------------------------------------------------
// Partition check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionDefect {
    /// Reachable status with no column.
    Unmapped(CanonicalStatus),
    /// Status claimed by more than one column.
    Duplicated {
        status: CanonicalStatus,
        columns: Vec<ColumnId>,
    },
}

impl fmt::Display for PartitionDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionDefect::Unmapped(s) => write!(f, "status {s} has no column"),
            PartitionDefect::Duplicated { status, columns } => {
                write!(f, "status {status} is in several columns: {columns:?}")
            }
        }
    }
}

/// Verify that `role`'s columns partition its reachable statuses.
pub fn check_partition(role: Role) -> Result<(), Vec<PartitionDefect>> {
    let cols = columns_for(role);
    let mut defects = Vec::new();
    for status in reachable_statuses(role) {
        let owners: Vec<ColumnId> = cols
            .iter()
            .filter(|c| c.contains(status))
            .map(|c| c.id)
            .collect();
        match owners.len() {
            0 => defects.push(PartitionDefect::Unmapped(status)),
            1 => {}
            _ => defects.push(PartitionDefect::Duplicated {
                status,
                columns: owners,
            }),
        }
    }
    if defects.is_empty() {
        Ok(())
    } else {
        Err(defects)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ColumnBucket<'a> {
    pub column: &'static StatusColumn,
    pub orders: Vec<&'a Order>,
}

#[derive(Debug, Clone)]
pub struct BoardProjection<'a> {
    pub columns: Vec<ColumnBucket<'a>>,
    /// Orders whose status no column claims. Always empty unless the column
    /// tables are broken.
    pub unmapped: Vec<&'a Order>,
}

impl<'a> BoardProjection<'a> {
    pub fn get(&self, id: &str) -> Option<&ColumnBucket<'a>> {
        self.columns.iter().find(|b| b.column.id == id)
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|b| b.orders.len()).sum::<usize>() + self.unmapped.len()
    }
}

/// Bucket `orders` into `role`'s columns, keeping input order inside each.
pub fn project<'a, I>(orders: I, role: Role) -> BoardProjection<'a>
where
    I: IntoIterator<Item = &'a Order>,
{
    let cols = columns_for(role);
    let mut buckets: Vec<ColumnBucket<'a>> = cols
        .iter()
        .map(|column| ColumnBucket {
            column,
            orders: Vec::new(),
        })
        .collect();
    let mut unmapped = Vec::new();

    for order in orders {
        match buckets.iter_mut().find(|b| b.column.contains(order.status())) {
            Some(bucket) => bucket.orders.push(order),
            None => {
                debug_assert!(
                    false,
                    "status {} has no column for {role}",
                    order.status()
                );
                error!(order_id = %order.id, status = %order.status(), %role, "order status has no board column");
                unmapped.push(order);
            }
        }
    }

    BoardProjection {
        columns: buckets,
        unmapped,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_roles_partition_cleanly() {
        for role in Role::ALL {
            assert_eq!(check_partition(role), Ok(()), "{role}");
        }
    }

    #[test]
    fn column_ids_are_unique_per_role() {
        for role in Role::ALL {
            let cols = columns_for(role);
            for (i, a) in cols.iter().enumerate() {
                for b in &cols[i + 1..] {
                    assert_ne!(a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn waiting_sits_in_role_specific_columns() {
        assert_eq!(column_for(Waiting, Role::Brand).unwrap().id, "andamento");
        assert_eq!(column_for(Waiting, Role::Supplier).unwrap().id, "aguardando");
    }
}
