use tracing::info;

use tripvisor_core::{new_id, ListParams, ListResult};

use super::{bounded, required, SocialError, SocialService};
use crate::model::{
    Category, CreateGroup, Discussion, Group, GroupFilter, GroupView, MemberRole, NewDiscussion, Reply,
    MAX_DISCUSSION_TITLE_LEN, MAX_GROUP_DESCRIPTION_LEN, MAX_GROUP_NAME_LEN,
};

fn must_be_member(group: &Group, user: &str, action: &str) -> Result<(), SocialError> {
    if !group.is_member(user) {
        return Err(SocialError::Forbidden(format!("you must be a member to {}", action)));
    }
    Ok(())
}

fn discussion_not_found(id: &str) -> SocialError {
    SocialError::NotFound(format!("discussion '{}' not found", id))
}

impl SocialService {
    /// Create a group. The owner becomes its first member, as admin.
    pub fn create_group(&self, owner: &str, input: CreateGroup) -> Result<Group, SocialError> {
        let name = bounded("group name", &input.name, MAX_GROUP_NAME_LEN)?;
        let description = bounded("group description", &input.description, MAX_GROUP_DESCRIPTION_LEN)?;
        let max_members = input.max_members.unwrap_or(self.config.max_group_members);
        if max_members == 0 {
            return Err(SocialError::Validation("a group needs room for at least one member".into()));
        }
        self.users.get_or_err(owner)?;

        let now = self.now();
        let mut group = Group {
            id: new_id(),
            name,
            description,
            category: input.category.unwrap_or(Category::Mixed),
            owner: owner.to_string(),
            admins: Default::default(),
            members: Vec::new(),
            member_count: 0,
            max_members,
            is_public: input.is_public.unwrap_or(true),
            is_active: true,
            discussions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        group.add_member(owner, MemberRole::Admin, now);

        let group = self.groups.insert(group)?;
        info!("group {} created by {}", group.id, owner);
        Ok(group)
    }

    pub fn get_group(&self, viewer: &str, group_id: &str) -> Result<GroupView, SocialError> {
        let group = self.groups.get_or_err(group_id)?;
        let user_role = group.member(viewer).map(|m| m.role);
        Ok(GroupView {
            is_member: user_role.is_some(),
            user_role,
            group,
        })
    }

    /// Public, active groups matching `filter`, most recently updated first.
    pub fn list_groups(&self, filter: &GroupFilter, params: &ListParams) -> Result<ListResult<Group>, SocialError> {
        let found = self.groups.find(
            |g| g.is_public && g.is_active && filter.matches(g),
            |g| g.updated_at,
            params.offset(),
            params.limit(),
        )?;
        Ok(ListResult::new(found.items, found.total, params))
    }

    /// Active groups `member` belongs to, newest first. Someone else's
    /// private groups are listed only if `viewer` is in them too.
    pub fn list_member_groups(
        &self,
        viewer: &str,
        member: &str,
        params: &ListParams,
    ) -> Result<ListResult<Group>, SocialError> {
        if viewer != member {
            self.users.get_or_err(member)?;
        }
        let found = self.groups.find(
            |g| g.is_active && g.is_member(member) && (g.is_public || g.is_member(viewer)),
            |g| g.created_at,
            params.offset(),
            params.limit(),
        )?;
        Ok(ListResult::new(found.items, found.total, params))
    }

    pub fn join_group(&self, group_id: &str, user: &str) -> Result<Group, SocialError> {
        self.users.get_or_err(user)?;
        let now = self.now();
        let (group, _) = self.groups.update(group_id, |group| {
            if !group.is_active {
                return Err(SocialError::NotActive("this group is no longer active".into()));
            }
            if !group.is_public {
                return Err(SocialError::Forbidden("this group is private".into()));
            }
            if group.is_member(user) {
                return Err(SocialError::Conflict("you are already a member of this group".into()));
            }
            if group.is_full() {
                return Err(SocialError::Conflict("this group is full".into()));
            }
            group.add_member(user, MemberRole::Member, now);
            Ok(())
        })?;

        info!("{} joined group {} ({} members)", user, group_id, group.member_count);
        Ok(group)
    }

    /// Leave a group. Admin rights go with the membership.
    pub fn leave_group(&self, group_id: &str, user: &str) -> Result<Group, SocialError> {
        let (group, _) = self.groups.update(group_id, |group| {
            if !group.remove_member(user) {
                return Err(SocialError::Conflict("you are not a member of this group".into()));
            }
            Ok(())
        })?;

        info!("{} left group {} ({} members)", user, group_id, group.member_count);
        Ok(group)
    }

    /// Start a discussion. Membership is checked against the state being written.
    pub fn add_discussion(
        &self,
        group_id: &str,
        author: &str,
        input: NewDiscussion,
    ) -> Result<Discussion, SocialError> {
        let title = bounded("discussion title", &input.title, MAX_DISCUSSION_TITLE_LEN)?;
        let content = required("discussion content", &input.content)?;
        let discussion = Discussion {
            id: new_id(),
            author: author.to_string(),
            title,
            content,
            likes: Default::default(),
            replies: Vec::new(),
            created_at: self.now(),
        };

        self.groups.update(group_id, |group| {
            must_be_member(group, author, "post discussions")?;
            group.discussions.push(discussion.clone());
            Ok::<_, SocialError>(())
        })?;

        info!("discussion {} started in group {} by {}", discussion.id, group_id, author);
        Ok(discussion)
    }

    /// Remove a discussion and its replies. Only its author may delete it.
    pub fn delete_discussion(&self, group_id: &str, discussion_id: &str, actor: &str) -> Result<(), SocialError> {
        self.groups.update(group_id, |group| {
            let discussion = group
                .discussion(discussion_id)
                .ok_or_else(|| discussion_not_found(discussion_id))?;
            if discussion.author != actor {
                return Err(SocialError::Forbidden("you can only delete your own discussions".into()));
            }
            group.discussions.retain(|d| d.id != discussion_id);
            Ok(())
        })?;

        info!("discussion {} deleted from group {} by {}", discussion_id, group_id, actor);
        Ok(())
    }

    pub fn add_reply(
        &self,
        group_id: &str,
        discussion_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Reply, SocialError> {
        let content = required("reply content", content)?;
        let reply = Reply {
            id: new_id(),
            author: author.to_string(),
            content,
            created_at: self.now(),
        };

        self.groups.update(group_id, |group| {
            must_be_member(group, author, "reply to discussions")?;
            let discussion = group
                .discussion_mut(discussion_id)
                .ok_or_else(|| discussion_not_found(discussion_id))?;
            discussion.replies.push(reply.clone());
            Ok::<_, SocialError>(())
        })?;

        info!("reply {} added to discussion {} by {}", reply.id, discussion_id, author);
        Ok(reply)
    }

    /// Remove a reply. Only its author may delete it; group admins cannot.
    pub fn delete_reply(
        &self,
        group_id: &str,
        discussion_id: &str,
        reply_id: &str,
        actor: &str,
    ) -> Result<(), SocialError> {
        self.groups.update(group_id, |group| {
            let discussion = group
                .discussion_mut(discussion_id)
                .ok_or_else(|| discussion_not_found(discussion_id))?;
            let reply = discussion
                .replies
                .iter()
                .find(|r| r.id == reply_id)
                .ok_or_else(|| SocialError::NotFound(format!("reply '{}' not found", reply_id)))?;
            if reply.author != actor {
                return Err(SocialError::Forbidden("you can only delete your own replies".into()));
            }
            discussion.replies.retain(|r| r.id != reply_id);
            Ok(())
        })?;

        info!("reply {} deleted from discussion {} by {}", reply_id, discussion_id, actor);
        Ok(())
    }
}
