//! Dashboard profile: fetched or created on first visit, editable in place.

use blogify_common::{
    BlogifyError, Database, FetchError, NewProfile, PersistenceError, Profile, ProfilePatch, User,
};

/// Fetch the user's profile, creating it from the provider metadata when
/// there is none yet.
pub async fn load_or_create<D: Database>(
    db: &D,
    table: &str,
    user: &User,
) -> Result<Profile, BlogifyError> {
    let existing: Option<Profile> = db
        .select_by_id(table, user.id.as_str())
        .await
        .map_err(|source| FetchError {
            table: table.into(),
            source,
        })?;

    if let Some(profile) = existing {
        return Ok(profile.merge_metadata(&user.metadata));
    }

    let profile = Profile::for_new_user(user);
    db.insert(table, &NewProfile::from(&profile))
        .await
        .map_err(|source| PersistenceError::Insert {
            table: table.into(),
            source,
        })?;
    tracing::info!(user_id = %user.id, name = %profile.name, "created profile");
    Ok(profile)
}

/// Edit state for the dashboard profile card.
#[derive(Debug, Clone)]
pub struct ProfileEditor {
    profile: Profile,
    edit: Option<ProfilePatch>,
}

impl ProfileEditor {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            edit: None,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    /// Start editing from the current values.
    pub fn begin(&mut self) -> &mut ProfilePatch {
        self.edit.insert(ProfilePatch::from(&self.profile))
    }

    pub fn edit_mut(&mut self) -> Option<&mut ProfilePatch> {
        self.edit.as_mut()
    }

    pub fn cancel(&mut self) {
        self.edit = None;
    }

    /// Write the edit and apply it locally. On failure editing continues.
    pub async fn save<D: Database>(&mut self, db: &D, table: &str) -> Result<(), BlogifyError> {
        let Some(patch) = self.edit.as_ref() else {
            return Ok(());
        };
        let id = self.profile.id.as_str();
        db.update(table, patch, id)
            .await
            .map_err(|source| {
                tracing::error!(%id, error = %source, "error updating profile");
                PersistenceError::Update {
                    table: table.into(),
                    id: id.into(),
                    source,
                }
            })?;

        if let Some(patch) = self.edit.take() {
            self.profile.name = patch.name;
            self.profile.location = patch.location;
            self.profile.company = patch.company;
            self.profile.twitter_username = patch.twitter_username;
        }
        Ok(())
    }
}
