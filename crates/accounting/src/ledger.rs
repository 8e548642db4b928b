//! Ledger persistence boundary and an in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use grni_core::{
    AccountId, CompanyId, DomainError, DomainResult, MoveId, MoveLineId, PurchaseLineId,
    ReconciliationId,
};

use crate::account_move::{Move, MoveOrigin, MoveState, ensure_balanced};
use crate::move_line::MoveLine;

/// A persisted line together with the move it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedLine {
    pub move_id: MoveId,
    pub company: CompanyId,
    pub origin: Option<MoveOrigin>,
    pub line: MoveLine,
}

/// Search predicate over persisted lines. `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineQuery {
    pub origin: Option<MoveOrigin>,
    pub account: Option<AccountId>,
    pub purchase_line: Option<PurchaseLineId>,
    pub reconciled: Option<bool>,
}

impl LineQuery {
    pub fn origin(mut self, origin: MoveOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn account(mut self, account: AccountId) -> Self {
        self.account = Some(account);
        self
    }

    pub fn purchase_line(mut self, line: PurchaseLineId) -> Self {
        self.purchase_line = Some(line);
        self
    }

    pub fn unreconciled(mut self) -> Self {
        self.reconciled = Some(false);
        self
    }

    pub fn matches(&self, origin: Option<MoveOrigin>, line: &MoveLine) -> bool {
        self.origin.is_none_or(|o| Some(o) == origin)
            && self.account.is_none_or(|a| a == line.account)
            && self.purchase_line.is_none_or(|p| Some(p) == line.purchase_line)
            && self.reconciled.is_none_or(|r| r == line.is_reconciled())
    }
}

/// Persistence operations consumed from the host.
pub trait LedgerRepository: Send + Sync {
    /// Validate, save and post a move. Posted moves are immutable.
    fn save_and_post(&self, mv: Move) -> DomainResult<MoveId>;

    fn search_lines(&self, query: &LineQuery) -> Vec<PostedLine>;

    /// Reconcile `lines` as one group; they must balance and be unreconciled.
    fn reconcile(&self, lines: &[MoveLineId]) -> DomainResult<ReconciliationId>;

    fn get_move(&self, id: MoveId) -> Option<Move>;

    /// Every line (reconciled or not) of `line` on `account`.
    fn lines_for_purchase_line(&self, line: PurchaseLineId, account: AccountId) -> Vec<MoveLine> {
        self.search_lines(&LineQuery::default().purchase_line(line).account(account))
            .into_iter()
            .map(|p| p.line)
            .collect()
    }
}

impl<S> LedgerRepository for Arc<S>
where
    S: LedgerRepository + ?Sized,
{
    fn save_and_post(&self, mv: Move) -> DomainResult<MoveId> {
        (**self).save_and_post(mv)
    }

    fn search_lines(&self, query: &LineQuery) -> Vec<PostedLine> {
        (**self).search_lines(query)
    }

    fn reconcile(&self, lines: &[MoveLineId]) -> DomainResult<ReconciliationId> {
        (**self).reconcile(lines)
    }

    fn get_move(&self, id: MoveId) -> Option<Move> {
        (**self).get_move(id)
    }
}

/// In-memory ledger for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    moves: RwLock<Vec<Move>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with previously posted moves (e.g. a replayed snapshot).
    pub fn with_moves(moves: Vec<Move>) -> Self {
        Self {
            moves: RwLock::new(moves),
        }
    }

    pub fn moves(&self) -> Vec<Move> {
        match self.moves.read() {
            Ok(m) => m.clone(),
            Err(_) => vec![],
        }
    }
}

impl LedgerRepository for InMemoryLedger {
    fn save_and_post(&self, mut mv: Move) -> DomainResult<MoveId> {
        mv.validate()?;
        mv.state = MoveState::Posted;
        let id = mv.id;
        let mut moves = self
            .moves
            .write()
            .map_err(|_| DomainError::invariant("ledger lock poisoned"))?;
        if moves.iter().any(|m| m.id == id) {
            return Err(DomainError::conflict(format!("move {id} already posted")));
        }
        tracing::debug!(move_id = %id, lines = mv.lines.len(), date = %mv.date, "move posted");
        moves.push(mv);
        Ok(id)
    }

    fn search_lines(&self, query: &LineQuery) -> Vec<PostedLine> {
        let moves = match self.moves.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        moves
            .iter()
            .filter(|m| m.state == MoveState::Posted)
            .flat_map(|m| {
                m.lines
                    .iter()
                    .filter(|l| query.matches(m.origin, l))
                    .map(|l| PostedLine {
                        move_id: m.id,
                        company: m.company,
                        origin: m.origin,
                        line: l.clone(),
                    })
            })
            .collect()
    }

    fn reconcile(&self, ids: &[MoveLineId]) -> DomainResult<ReconciliationId> {
        if ids.is_empty() {
            return Err(DomainError::validation("nothing to reconcile"));
        }
        let wanted: HashSet<MoveLineId> = ids.iter().copied().collect();
        let mut moves = self
            .moves
            .write()
            .map_err(|_| DomainError::invariant("ledger lock poisoned"))?;

        let selected: Vec<MoveLine> = moves
            .iter()
            .flat_map(|m| m.lines.iter())
            .filter(|l| wanted.contains(&l.id))
            .cloned()
            .collect();

        if selected.len() != wanted.len() {
            return Err(DomainError::not_found("move line to reconcile"));
        }
        if selected.iter().any(MoveLine::is_reconciled) {
            return Err(DomainError::conflict("line already reconciled"));
        }
        if let Some(first) = selected.first() {
            if selected.iter().any(|l| l.account != first.account) {
                return Err(DomainError::validation(
                    "reconciled lines must share one account",
                ));
            }
        }
        ensure_balanced(&selected)?;

        let reconciliation = ReconciliationId::new();
        for line in moves.iter_mut().flat_map(|m| m.lines.iter_mut()) {
            if wanted.contains(&line.id) {
                line.reconciliation = Some(reconciliation);
            }
        }
        Ok(reconciliation)
    }

    fn get_move(&self, id: MoveId) -> Option<Move> {
        let moves = self.moves.read().ok()?;
        moves.iter().find(|m| m.id == id).cloned()
    }
}
