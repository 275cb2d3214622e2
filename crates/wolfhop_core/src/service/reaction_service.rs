//! Reaction ledger: one reaction per user per reflection.

use super::error::{Entity, ServiceError, ServiceResult};
use crate::model::reflection::{Reaction, ReflectionId};
use crate::model::user::UserId;
use crate::repo::reflection_repo::ReflectionRepository;
use crate::repo::RepoError;
use log::info;

pub struct ReactionService<R: ReflectionRepository> {
    reflections: R,
}

impl<R: ReflectionRepository> ReactionService<R> {
    pub fn new(reflections: R) -> Self {
        Self { reflections }
    }

    /// Records `user_id`'s reaction to a reflection.
    ///
    /// A missing or blank `reaction_type` becomes `tell_me_more`.
    ///
    /// # Errors
    /// - `NotFound(Reflection)` when the reflection does not exist.
    /// - `DuplicateReaction` when the user already reacted, including when a
    ///   concurrent insert wins the unique constraint.
    pub fn react(
        &self,
        reflection_id: ReflectionId,
        user_id: UserId,
        reaction_type: Option<&str>,
    ) -> ServiceResult<Reaction> {
        if self.reflections.get_reflection(reflection_id)?.is_none() {
            return Err(ServiceError::NotFound(Entity::Reflection, reflection_id));
        }
        if self
            .reflections
            .find_reaction(reflection_id, user_id)?
            .is_some()
        {
            return Err(ServiceError::DuplicateReaction);
        }

        let reaction = Reaction::new(reflection_id, user_id, reaction_type);
        self.reflections
            .record_reaction(&reaction)
            .map_err(|err| match err {
                RepoError::Conflict(_) => ServiceError::DuplicateReaction,
                RepoError::NotFound(id) => ServiceError::NotFound(Entity::Reflection, id),
                other => other.into(),
            })?;

        info!(
            "event=reaction_record module=service status=ok reflection_id={} reaction_id={}",
            reflection_id, reaction.id
        );
        Ok(reaction)
    }
}
