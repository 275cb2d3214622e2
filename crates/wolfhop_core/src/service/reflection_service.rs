//! Reflection visibility use-cases.
//!
//! # Responsibility
//! - Persist reflections and fan out `reflection_shared` notifications.
//! - Compute the set of reflections a user may see and authorize single reads.
//!
//! # Invariants
//! - Visible = authored, then herd-shared to any herd the user belongs to,
//!   then friend-shared to the user; each reflection appears once.
//! - Single reads authorize the author and members of the target herd only.
//!   Friend-shared reflections are not readable one-by-one by their target.
//! - Reaction ids that no longer resolve are skipped.

use super::error::{Entity, ServiceError, ServiceResult};
use super::notifier::NotificationEmitter;
use crate::model::notification::NOTIFICATION_REFLECTION_SHARED;
use crate::model::reflection::{
    Reaction, ReactionId, Reflection, ReflectionDraft, ReflectionId, ReflectionWithReactions,
    ShareKind, ShareTarget,
};
use crate::model::user::{User, UserId};
use crate::repo::herd_repo::HerdRepository;
use crate::repo::reflection_repo::ReflectionRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::{info, warn};
use std::collections::{HashMap, HashSet};

const NOT_AUTHORIZED: &str = "Not authorized to view this reflection";

/// Reflection facade.
pub struct ReflectionService<U, H, R, N>
where
    U: UserRepository,
    H: HerdRepository,
    R: ReflectionRepository,
    N: NotificationEmitter,
{
    users: U,
    herds: H,
    reflections: R,
    notifier: N,
}

impl<U, H, R, N> ReflectionService<U, H, R, N>
where
    U: UserRepository,
    H: HerdRepository,
    R: ReflectionRepository,
    N: NotificationEmitter,
{
    pub fn new(users: U, herds: H, reflections: R, notifier: N) -> Self {
        Self {
            users,
            herds,
            reflections,
            notifier,
        }
    }

    /// Persists a reflection authored by `author_id` and notifies its
    /// audience.
    ///
    /// Notification fan-out never fails the create; a herd that no longer
    /// exists simply yields no notifications.
    pub fn create(&self, author_id: UserId, draft: ReflectionDraft) -> ServiceResult<Reflection> {
        let author = self
            .users
            .get_user(author_id)?
            .ok_or(ServiceError::NotFound(Entity::User, author_id))?;

        let reflection = Reflection::new(author_id, draft);
        self.reflections.create_reflection(&reflection)?;
        info!(
            "event=reflection_create module=service status=ok reflection_id={} share={}",
            reflection.id,
            reflection.share.kind().as_str()
        );

        if let Err(err) = self.notify_audience(&author, &reflection) {
            warn!(
                "event=reflection_fanout module=service status=error reflection_id={} error={}",
                reflection.id, err
            );
        }
        Ok(reflection)
    }

    /// Every reflection `user_id` may see, with reactions resolved.
    pub fn list_visible(&self, user_id: UserId) -> ServiceResult<Vec<ReflectionWithReactions>> {
        let authored = self.reflections.list_reflections_by_author(user_id)?;

        let herd_ids = self
            .herds
            .list_herds_for_member(user_id)?
            .into_iter()
            .map(|herd| herd.id)
            .collect::<Vec<_>>();
        let herd_shared = self
            .reflections
            .list_reflections_shared_with(ShareKind::Herd, &herd_ids)?;
        let friend_shared = self
            .reflections
            .list_reflections_shared_with(ShareKind::Friend, &[user_id])?;

        let mut seen = HashSet::new();
        let visible = authored
            .into_iter()
            .chain(herd_shared)
            .chain(friend_shared)
            .filter(|reflection| seen.insert(reflection.id))
            .collect::<Vec<_>>();

        let reaction_ids = visible
            .iter()
            .flat_map(|reflection| reflection.reaction_ids.iter().copied())
            .collect::<Vec<_>>();
        let mut reactions_by_id = self
            .reflections
            .list_reactions_by_ids(&reaction_ids)?
            .into_iter()
            .map(|reaction| (reaction.id, reaction))
            .collect::<HashMap<_, _>>();

        Ok(visible
            .into_iter()
            .map(|reflection| {
                let reactions = take_reactions(&reflection.reaction_ids, &mut reactions_by_id);
                ReflectionWithReactions {
                    reflection,
                    reactions,
                }
            })
            .collect())
    }

    /// One reflection, if `user_id` is its author or a member of its herd.
    pub fn get_one(
        &self,
        reflection_id: ReflectionId,
        user_id: UserId,
    ) -> ServiceResult<ReflectionWithReactions> {
        let reflection = self
            .reflections
            .get_reflection(reflection_id)?
            .ok_or(ServiceError::NotFound(Entity::Reflection, reflection_id))?;

        if !self.can_read(&reflection, user_id)? {
            return Err(ServiceError::Forbidden(NOT_AUTHORIZED));
        }

        let mut reactions_by_id = self
            .reflections
            .list_reactions_by_ids(&reflection.reaction_ids)?
            .into_iter()
            .map(|reaction| (reaction.id, reaction))
            .collect::<HashMap<_, _>>();
        let reactions = take_reactions(&reflection.reaction_ids, &mut reactions_by_id);
        Ok(ReflectionWithReactions {
            reflection,
            reactions,
        })
    }

    fn can_read(&self, reflection: &Reflection, user_id: UserId) -> ServiceResult<bool> {
        if reflection.is_author(user_id) {
            return Ok(true);
        }
        match reflection.share {
            ShareTarget::Herd(herd_id) => Ok(self
                .herds
                .get_herd(herd_id)?
                .is_some_and(|herd| herd.is_member(user_id))),
            ShareTarget::SelfOnly | ShareTarget::Friend(_) => Ok(false),
        }
    }

    fn notify_audience(&self, author: &User, reflection: &Reflection) -> RepoResult<()> {
        match reflection.share {
            ShareTarget::SelfOnly => {}
            ShareTarget::Friend(recipient_id) => self.notifier.emit(
                author.id,
                recipient_id,
                NOTIFICATION_REFLECTION_SHARED,
                &format!("{} shared a reflection with you", author.display_name),
            ),
            ShareTarget::Herd(herd_id) => {
                let Some(herd) = self.herds.get_herd(herd_id)? else {
                    return Ok(());
                };
                let message = format!(
                    "{} shared a reflection with your herd: {}",
                    author.display_name, herd.name
                );
                for member_id in herd.member_ids.iter().filter(|id| **id != author.id) {
                    self.notifier.emit(
                        author.id,
                        *member_id,
                        NOTIFICATION_REFLECTION_SHARED,
                        &message,
                    );
                }
            }
        }
        Ok(())
    }
}

fn take_reactions(
    reaction_ids: &[ReactionId],
    reactions_by_id: &mut HashMap<ReactionId, Reaction>,
) -> Vec<Reaction> {
    reaction_ids
        .iter()
        .filter_map(|id| reactions_by_id.remove(id))
        .collect()
}
