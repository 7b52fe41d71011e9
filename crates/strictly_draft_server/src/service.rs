//! Draft request layer.
//!
//! Every operation reads fresh state from the store, decides with the pure
//! draft logic, and writes back through a conditional store call. Derived
//! state is never cached between requests.

use chrono::Utc;
use derive_getters::Getters;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, warn};

use crate::ServiceError;
use crate::store::{AppendOutcome, DraftStore, UpdateOutcome};
use strictly_draft::{
    CardId, Catalog, CoreError, DenyReason, DerivedDraftState, Draft, DraftAction, DraftId,
    DraftLog, DraftRecord, DraftStatus, ErrorClass, InitialRoll, PickDecision, PickEvent,
    PickValidator, PlayerId, PoolConfig, ProposedPick, Readiness, RulesConfig, Session,
    SessionId, SessionStatus, WinCondition, generate_pool, reconstruct, resolve_first_player,
};

/// Attempts made by read-modify-write updates before reporting a conflict.
pub const MAX_UPDATE_RETRIES: usize = 5;

/// Result of a pick proposal that reached the validation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PickOutcome {
    /// The pick was appended; carries the state replayed after it.
    Allowed(DerivedDraftState),
    /// The pick was refused and nothing was written.
    Denied(DenyReason),
}

/// A draft with the state derived from its current log.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct DraftSnapshot {
    draft: Draft,
    /// `None` until the first turn is resolved.
    state: Option<DerivedDraftState>,
    /// Cards the player on turn may take. Empty unless drafting.
    legal_picks: Vec<CardId>,
    #[getter(skip)]
    actions: &'static [DraftAction],
}

impl DraftSnapshot {
    /// Actions the draft's status allows.
    pub fn actions(&self) -> &'static [DraftAction] {
        self.actions
    }
}

/// Runs draft and session operations against a [`DraftStore`].
#[derive(Debug)]
pub struct DraftService<S> {
    store: S,
    catalog: Arc<Catalog>,
    rules: RulesConfig,
    pool: Option<PoolConfig>,
    rng: Mutex<StdRng>,
}

impl<S: DraftStore> DraftService<S> {
    /// Creates a service over a store and a shared catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Core`] if the rules cannot be played.
    #[instrument(skip(store, catalog), fields(cards = catalog.len()))]
    pub fn new(store: S, catalog: Arc<Catalog>, rules: RulesConfig) -> Result<Self, ServiceError> {
        rules.validate()?;
        info!(points_budget = rules.points_budget(), "Creating DraftService");
        Ok(Self {
            store,
            catalog,
            rules,
            pool: None,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Generates a pool for every new draft.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Replaces the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The shared catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The rules every draft is validated against.
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Opens a session between two players.
    #[instrument(skip(self))]
    pub fn create_session(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> Result<Session, ServiceError> {
        let id = SessionId::new(self.next_id("session"));
        let session = Session::new(id, player1, player2)?;
        self.store.insert_session(&session)?;
        info!(session = %session.id(), "Session created");
        Ok(session)
    }

    /// Offers the next game of a session: creates a draft in
    /// `INVITE_TO_DRAFT` addressed to the other participant.
    ///
    /// Uses the configured points budget unless `points_budget` is given.
    #[instrument(skip(self))]
    pub fn invite_to_draft(
        &self,
        session_id: &SessionId,
        inviter: &PlayerId,
        points_budget: Option<u32>,
    ) -> Result<Draft, ServiceError> {
        let session = self.store.load_session(session_id)?;
        if !session.is_participant(inviter) {
            return Err(ServiceError::NotParticipant(inviter.clone()));
        }
        let invitee = if session.player1() == inviter {
            session.player2().clone()
        } else {
            session.player1().clone()
        };
        let budget = points_budget.unwrap_or(*self.rules.points_budget());
        if budget == 0 {
            return Err(CoreError::InvalidRules("points budget must be positive".into()).into());
        }

        let id = DraftId::new(self.next_id("draft"));
        let mut draft = Draft::invite(id, session_id.clone(), inviter.clone(), invitee, budget)?;
        if let Some(config) = &self.pool {
            let pool = generate_pool(&self.catalog, config, &mut *self.rng())?;
            debug!(cards = pool.card_ids().len(), total_cost = pool.total_cost(), "Pool generated");
            draft = draft.with_pool(pool.card_ids().clone());
        }
        self.store.insert_draft(&draft)?;

        let opened = self.update_session(session_id, |session| {
            session.open_game(draft.id().clone())?;
            Ok(())
        });
        if let Err(err) = opened {
            warn!(error = %err, "Session refused the game, withdrawing draft");
            self.update_draft(draft.id(), |d| Ok(d.transition(DraftStatus::Finished)?))?;
            return Err(err);
        }
        info!(draft = %draft.id(), budget, "Draft invitation sent");
        Ok(draft)
    }

    /// Accepts an invitation: the draft moves to `DRAFT` and the first turn
    /// is rolled.
    #[instrument(skip(self))]
    pub fn accept_invitation(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
    ) -> Result<Draft, ServiceError> {
        let draft = self.update_draft(draft_id, |draft| {
            require_drafter(draft, player)?;
            if draft.player2() != player {
                return Err(ServiceError::NotPermitted(
                    "only the invited player can accept".into(),
                ));
            }
            draft.transition(DraftStatus::Draft)?;
            let roll = self.roll(draft)?;
            draft.record_roll(roll);
            Ok(())
        })?;
        info!(first = ?draft.seating().map(|(first, _)| first), "Invitation accepted");
        Ok(self.reconcile(draft))
    }

    /// Declines or withdraws an invitation. The draft is finished and the
    /// session is free again.
    #[instrument(skip(self))]
    pub fn decline_invitation(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
    ) -> Result<Draft, ServiceError> {
        let draft = self.update_draft(draft_id, |draft| {
            require_drafter(draft, player)?;
            Ok(draft.transition(DraftStatus::Finished)?)
        })?;
        info!("Invitation declined");
        self.follow_draft(&draft);
        Ok(draft)
    }

    /// Returns the first-turn roll, rolling it if the draft has none yet.
    ///
    /// Calling this again never re-rolls.
    #[instrument(skip(self))]
    pub fn resolve_first_turn(&self, draft_id: &DraftId) -> Result<InitialRoll, ServiceError> {
        let draft = self.store.load_draft(draft_id)?;
        if let Some(roll) = draft.initial_roll() {
            debug!("First turn already resolved");
            return Ok(roll.clone());
        }
        let draft = self.update_draft(draft_id, |draft| {
            if draft.initial_roll().is_none() {
                if *draft.status() != DraftStatus::Draft {
                    return Err(ServiceError::NotDrafting(*draft.status()));
                }
                let roll = self.roll(draft)?;
                draft.record_roll(roll);
            }
            Ok(())
        })?;
        draft
            .initial_roll()
            .clone()
            .ok_or_else(|| ServiceError::FirstTurnUnresolved(draft_id.clone()))
    }

    /// Proposes a pick.
    ///
    /// Reads the log, replays it, validates, and appends only if no other
    /// pick landed in between. A lost race is reported as
    /// [`ServiceError::Conflict`]; the caller should re-fetch and retry.
    #[instrument(skip(self), fields(draft = %draft_id, player = %player, card = %card_id))]
    pub fn propose_pick(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
        card_id: &CardId,
    ) -> Result<PickOutcome, ServiceError> {
        let draft = self.store.load_draft(draft_id)?;
        require_drafter(&draft, player)?;
        let draft = self.reconcile(draft);
        if *draft.status() != DraftStatus::Draft {
            return Err(ServiceError::NotDrafting(*draft.status()));
        }
        let catalog = self.draft_catalog(&draft)?;
        let (log, state) = self.replay(&draft, &catalog)?;
        let validator = PickValidator::new(&catalog, &self.rules);

        let pick = ProposedPick::new(player.clone(), card_id.clone());
        if let PickDecision::Denied(reason) = validator.validate(&state, &draft, &pick) {
            if reason.class() == ErrorClass::Fatal {
                error!(reason = %reason, "Pick references a card outside the draft catalog");
                self.fail_quietly(draft_id, &format!("pick of unknown card '{}'", card_id));
            } else {
                warn!(reason = %reason, "Pick denied");
            }
            return Ok(PickOutcome::Denied(reason));
        }

        let seq = log.next_seq();
        let event = PickEvent::new(draft_id.clone(), player.clone(), card_id.clone(), seq, Utc::now());
        match self
            .store
            .append_if_sequence_matches(draft_id, *draft.attempt(), seq, &event)?
        {
            AppendOutcome::Appended => info!(seq, "Pick accepted"),
            AppendOutcome::Conflict => {
                warn!(seq, "Pick lost the race");
                return Err(ServiceError::Conflict(format!(
                    "draft '{}' changed before pick {} was stored",
                    draft_id, seq
                )));
            }
        }

        // The pick is stored. Only corruption is reported as an error from
        // here; a failed status update is repaired by the next request.
        let mut events = log.events().to_vec();
        events.push(event);
        let (first, second) = seats(&draft)?;
        let state = reconstruct(&events, &catalog, first, second)
            .map_err(|err| self.corrupted(draft_id, err))?;
        if cfg!(debug_assertions) {
            self.check_invariants(&draft, &events, &state)?;
        }

        if validator.is_complete(&state, &draft) {
            match self.settle_completion(draft_id, *draft.attempt()) {
                Ok(settled) => self.follow_draft(&settled),
                Err(err) => warn!(error = %err, "Draft complete but status not updated"),
            }
        }
        Ok(PickOutcome::Allowed(state))
    }

    /// Asks to start the draft over.
    #[instrument(skip(self))]
    pub fn request_reset(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
    ) -> Result<DraftStatus, ServiceError> {
        let draft = self.update_draft(draft_id, |draft| {
            require_drafter(draft, player)?;
            Ok(draft.request_reset(player)?)
        })?;
        info!("Reset requested");
        self.follow_draft(&draft);
        Ok(*draft.status())
    }

    /// Answers a pending reset. Accepting starts a fresh attempt with a new
    /// roll; refusing resumes the current log.
    #[instrument(skip(self))]
    pub fn respond_to_reset(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
        accept: bool,
    ) -> Result<Draft, ServiceError> {
        let draft = self.update_draft(draft_id, |draft| {
            require_drafter(draft, player)?;
            if draft.reset_requested_by().as_ref() == Some(player) {
                return Err(ServiceError::NotPermitted(
                    "a reset must be answered by the other player".into(),
                ));
            }
            if accept {
                let roll = self.roll(draft)?;
                Ok(draft.accept_reset(roll)?)
            } else {
                Ok(draft.decline_reset()?)
            }
        })?;
        info!(accept, attempt = draft.attempt(), "Reset answered");
        Ok(self.reconcile(draft))
    }

    /// Starts the game built from a completed draft.
    ///
    /// Both players must be ready; the draft is consumed and the session
    /// moves to `IN_PROGRESS`.
    #[instrument(skip(self))]
    pub fn start_game(
        &self,
        draft_id: &DraftId,
        player: &PlayerId,
    ) -> Result<Session, ServiceError> {
        let draft = self.store.load_draft(draft_id)?;
        require_drafter(&draft, player)?;
        let draft = self.reconcile(draft);
        if *draft.status() != DraftStatus::Available {
            return Err(ServiceError::NotPermitted(format!(
                "a game needs an AVAILABLE draft, this one is {}",
                draft.status()
            )));
        }
        let catalog = self.draft_catalog(&draft)?;
        let (_, state) = self.replay(&draft, &catalog)?;
        let validator = PickValidator::new(&catalog, &self.rules);
        for drafter in [draft.player1(), draft.player2()] {
            let readiness = validator.readiness(&state, &draft, drafter)?;
            if readiness != Readiness::Ready {
                warn!(player = %drafter, ?readiness, "Player not ready");
                return Err(ServiceError::NotReady {
                    player: drafter.clone(),
                    readiness,
                });
            }
        }

        let draft = self.update_draft(draft_id, |d| Ok(d.transition(DraftStatus::Finished)?))?;
        info!("Game started");
        match self.sync_session(&draft) {
            Ok(session) => Ok(session),
            Err(err) => {
                warn!(error = %err, "Game started but session not updated");
                Ok(self.store.load_session(draft.session_id())?)
            }
        }
    }

    /// Reports the running game's result.
    #[instrument(skip(self))]
    pub fn finish_game(
        &self,
        session_id: &SessionId,
        winner: Option<PlayerId>,
        condition: Option<WinCondition>,
    ) -> Result<Session, ServiceError> {
        self.update_session(session_id, |session| {
            Ok(session.record_result(winner.clone(), condition)?)
        })
    }

    /// Closes a session and freezes its score.
    #[instrument(skip(self))]
    pub fn finish_session(
        &self,
        session_id: &SessionId,
        player: &PlayerId,
    ) -> Result<SessionStatus, ServiceError> {
        let session = self.update_session(session_id, |session| {
            if !session.is_participant(player) {
                return Err(ServiceError::NotParticipant(player.clone()));
            }
            Ok(session.transition(SessionStatus::Finished)?)
        })?;
        info!(
            player1_score = session.player1_score(),
            player2_score = session.player2_score(),
            "Session finished"
        );
        Ok(*session.status())
    }

    /// Loads a draft together with its replayed state and the picks open to
    /// the player on turn.
    #[instrument(skip(self))]
    pub fn draft_state(&self, draft_id: &DraftId) -> Result<DraftSnapshot, ServiceError> {
        let draft = self.reconcile(self.store.load_draft(draft_id)?);
        let (state, legal_picks) = if draft.seating().is_some() {
            let catalog = self.draft_catalog(&draft)?;
            let (_, state) = self.replay(&draft, &catalog)?;
            let legal = if *draft.status() == DraftStatus::Draft {
                PickValidator::new(&catalog, &self.rules).legal_picks(&state, &draft)
            } else {
                Vec::new()
            };
            (Some(state), legal)
        } else {
            (None, Vec::new())
        };
        Ok(DraftSnapshot {
            actions: draft.status().actions(),
            draft,
            state,
            legal_picks,
        })
    }

    /// Exports a draft with its serialized history.
    #[instrument(skip(self))]
    pub fn export_draft(&self, draft_id: &DraftId) -> Result<DraftRecord, ServiceError> {
        let draft = self.store.load_draft(draft_id)?;
        let events = self.store.read_log(draft_id, *draft.attempt())?;
        let log = DraftLog::from_events(events).map_err(|err| self.corrupted(draft_id, err))?;
        Ok(DraftRecord::build(&draft, log)?)
    }

    /// Moves a draft and its session to `ERROR`.
    #[instrument(skip(self))]
    pub fn fail_draft(&self, draft_id: &DraftId, reason: &str) -> Result<(), ServiceError> {
        error!(reason, "Draft is corrupt, moving to ERROR");
        let draft = self.update_draft(draft_id, |draft| {
            if !draft.status().is_terminal() {
                draft.transition(DraftStatus::Error)?;
            }
            Ok(())
        })?;
        self.sync_session(&draft)?;
        Ok(())
    }

    fn fail_quietly(&self, draft_id: &DraftId, reason: &str) {
        if let Err(err) = self.fail_draft(draft_id, reason) {
            warn!(error = %err, "Could not move draft to ERROR");
        }
    }

    fn corrupted(&self, draft_id: &DraftId, err: CoreError) -> ServiceError {
        if let CoreError::MalformedHistory(reason) = &err {
            self.fail_quietly(draft_id, reason);
        }
        ServiceError::Core(err)
    }

    fn replay(
        &self,
        draft: &Draft,
        catalog: &Catalog,
    ) -> Result<(DraftLog, DerivedDraftState), ServiceError> {
        let (first, second) = seats(draft)?;
        let events = self.store.read_log(draft.id(), *draft.attempt())?;
        DraftLog::from_events(events)
            .and_then(|log| {
                let state = reconstruct(log.events(), catalog, first, second)?;
                Ok((log, state))
            })
            .map_err(|err| self.corrupted(draft.id(), err))
    }

    fn check_invariants(
        &self,
        draft: &Draft,
        events: &[PickEvent],
        state: &DerivedDraftState,
    ) -> Result<(), ServiceError> {
        use strictly_draft::{DraftInvariants, InvariantSet, ReplayView};
        let view = ReplayView::new(events, state, *draft.points_budget());
        DraftInvariants::check_all(&view).map_err(|violations| {
            let reason = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.corrupted(draft.id(), CoreError::malformed(reason))
        })
    }

    fn draft_catalog(&self, draft: &Draft) -> Result<Arc<Catalog>, ServiceError> {
        match draft.pool() {
            Some(pool) => Ok(Arc::new(self.catalog.subset(pool)?)),
            None => Ok(Arc::clone(&self.catalog)),
        }
    }

    fn settle_if_complete(&self, draft: Draft) -> Result<Draft, ServiceError> {
        if *draft.status() != DraftStatus::Draft {
            return Ok(draft);
        }
        let catalog = self.draft_catalog(&draft)?;
        let (_, state) = self.replay(&draft, &catalog)?;
        if PickValidator::new(&catalog, &self.rules).is_complete(&state, &draft) {
            return self.settle_completion(draft.id(), *draft.attempt());
        }
        Ok(draft)
    }

    /// Moves a finished attempt to `AVAILABLE`. A draft that was reset or
    /// left `DRAFT` in the meantime is left alone.
    fn settle_completion(&self, draft_id: &DraftId, attempt: u32) -> Result<Draft, ServiceError> {
        self.update_draft(draft_id, |draft| {
            if *draft.status() == DraftStatus::Draft && *draft.attempt() == attempt {
                draft.transition(DraftStatus::Available)?;
                info!("Draft complete");
            }
            Ok(())
        })
    }

    /// Repairs status left behind by an interrupted request: settles a
    /// finished attempt and brings the session in line with the draft.
    /// Failures are logged and the draft is returned as it was read.
    fn reconcile(&self, draft: Draft) -> Draft {
        let draft = match self.settle_if_complete(draft.clone()) {
            Ok(settled) => settled,
            Err(err) => {
                warn!(error = %err, "Could not settle draft");
                draft
            }
        };
        self.follow_draft(&draft);
        draft
    }

    fn follow_draft(&self, draft: &Draft) {
        if let Err(err) = self.sync_session(draft) {
            warn!(error = %err, "Session lags behind its draft");
        }
    }

    /// Moves the session to the status its current draft implies.
    fn sync_session(&self, draft: &Draft) -> Result<Session, ServiceError> {
        let session = self.store.load_session(draft.session_id())?;
        if session.current_draft() != Some(draft.id())
            || !session_follows(*draft.status(), *session.status())
        {
            return Ok(session);
        }
        self.update_session(draft.session_id(), |session| {
            if session.current_draft() != Some(draft.id()) {
                return Ok(());
            }
            match (*draft.status(), *session.status()) {
                (DraftStatus::Finished, SessionStatus::InviteToDraft) => session.cancel_game()?,
                (status, current) => {
                    if let Some(target) = session_target(status, current) {
                        session.transition(target)?;
                    }
                }
            }
            Ok(())
        })
    }

    fn roll(&self, draft: &Draft) -> Result<InitialRoll, ServiceError> {
        Ok(resolve_first_player(
            draft.player1(),
            draft.player2(),
            *self.rules.die_faces(),
            &mut *self.rng(),
        )?)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{:016x}", prefix, self.rng().next_u64())
    }

    fn update_draft<F>(&self, draft_id: &DraftId, mut change: F) -> Result<Draft, ServiceError>
    where
        F: FnMut(&mut Draft) -> Result<(), ServiceError>,
    {
        for attempt in 1..=MAX_UPDATE_RETRIES {
            let mut draft = self.store.load_draft(draft_id)?;
            let expected = *draft.revision();
            change(&mut draft)?;
            match self.store.compare_and_update_draft(&draft, expected)? {
                UpdateOutcome::Applied { revision } => {
                    draft.set_revision(revision);
                    return Ok(draft);
                }
                UpdateOutcome::Conflict => debug!(attempt, "Draft changed underneath, reloading"),
            }
        }
        Err(ServiceError::Conflict(format!("draft '{}' kept changing", draft_id)))
    }

    fn update_session<F>(
        &self,
        session_id: &SessionId,
        mut change: F,
    ) -> Result<Session, ServiceError>
    where
        F: FnMut(&mut Session) -> Result<(), ServiceError>,
    {
        for attempt in 1..=MAX_UPDATE_RETRIES {
            let mut session = self.store.load_session(session_id)?;
            let expected = *session.revision();
            change(&mut session)?;
            match self.store.compare_and_update_session(&session, expected)? {
                UpdateOutcome::Applied { revision } => {
                    session.set_revision(revision);
                    return Ok(session);
                }
                UpdateOutcome::Conflict => {
                    debug!(attempt, "Session changed underneath, reloading")
                }
            }
        }
        Err(ServiceError::Conflict(format!("session '{}' kept changing", session_id)))
    }
}

/// Session status a draft in `draft` status moves a session in `session`
/// status to, if any.
fn session_target(draft: DraftStatus, session: SessionStatus) -> Option<SessionStatus> {
    match (draft, session) {
        (DraftStatus::Draft, SessionStatus::InviteToDraft | SessionStatus::DraftResetRequest) => {
            Some(SessionStatus::Draft)
        }
        (DraftStatus::Available, SessionStatus::DraftResetRequest) => Some(SessionStatus::Draft),
        (DraftStatus::DraftResetRequest, SessionStatus::Draft) => {
            Some(SessionStatus::DraftResetRequest)
        }
        (DraftStatus::Finished, SessionStatus::Draft) => Some(SessionStatus::InProgress),
        (DraftStatus::Error, status) if !status.is_terminal() => Some(SessionStatus::Error),
        _ => None,
    }
}

fn session_follows(draft: DraftStatus, session: SessionStatus) -> bool {
    matches!((draft, session), (DraftStatus::Finished, SessionStatus::InviteToDraft))
        || session_target(draft, session).is_some()
}

fn require_drafter(draft: &Draft, player: &PlayerId) -> Result<(), ServiceError> {
    if draft.is_participant(player) {
        Ok(())
    } else {
        Err(ServiceError::NotParticipant(player.clone()))
    }
}

fn seats(draft: &Draft) -> Result<(&PlayerId, &PlayerId), ServiceError> {
    draft
        .seating()
        .ok_or_else(|| ServiceError::FirstTurnUnresolved(draft.id().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use strictly_draft::Card;

    fn service() -> DraftService<InMemoryStore> {
        let catalog = Catalog::from_cards([
            Card::new("zeus", "Zeus", 6),
            Card::new("odin", "Odin", 5),
            Card::new("hoplite", "Hoplite", 4),
        ])
        .unwrap();
        DraftService::new(InMemoryStore::new(), Arc::new(catalog), RulesConfig::default())
            .unwrap()
            .with_seed(7)
    }

    #[test]
    fn test_ids_are_prefixed_and_distinct() {
        let service = service();
        let a = service.next_id("draft");
        let b = service.next_id("draft");
        assert!(a.starts_with("draft-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_first_turn_is_rolled_once() {
        let service = service();
        let session = service.create_session("a".into(), "b".into()).unwrap();
        let draft = service.invite_to_draft(session.id(), &"a".into(), None).unwrap();
        let draft = service.accept_invitation(draft.id(), &"b".into()).unwrap();
        let roll = service.resolve_first_turn(draft.id()).unwrap();
        assert_eq!(Some(&roll), draft.initial_roll().as_ref());
        assert_eq!(service.resolve_first_turn(draft.id()).unwrap(), roll);
    }

    #[test]
    fn test_inviter_cannot_accept_own_invitation() {
        let service = service();
        let session = service.create_session("a".into(), "b".into()).unwrap();
        let draft = service.invite_to_draft(session.id(), &"a".into(), None).unwrap();
        let err = service.accept_invitation(draft.id(), &"a".into()).unwrap_err();
        assert!(matches!(err, ServiceError::NotPermitted(_)));
    }

    #[test]
    fn test_rejects_unplayable_rules() {
        let result = DraftService::new(
            InMemoryStore::new(),
            Arc::new(Catalog::default()),
            RulesConfig::default().with_die_faces(1),
        );
        assert!(matches!(result, Err(ServiceError::Core(CoreError::InvalidRules(_)))));
    }
}
