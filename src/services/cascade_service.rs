//! Orchestrateur de suppression en cascade. Le store ne cascade rien
//! tout seul : l'ordre des étapes garantit qu'aucune ligne enfant ne
//! survit à son parent. En cas d'interruption, on préfère laisser un
//! parent orphelin (profil ou compte d'identité) que des enfants
//! pendants (images, favoris).

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{annonces, favoris, images, users};
use crate::platform::Platform;
use crate::platform::store::Filter;

pub struct CascadeService;

impl CascadeService {
    /// Supprime une annonce, ses images (octets + métadonnées) et la ligne.
    /// Refuse si l'annonce n'existe pas (404) ou si `user_id` n'en est pas
    /// propriétaire (403).
    pub async fn delete_annonce(
        platform: &Platform,
        annonce_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        let annonce = annonces::get_annonce_row(platform.store.as_ref(), annonce_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Annonce non trouvée.".to_string()))?;
        if annonce.user_id != user_id {
            return Err(ApiError::Forbidden(
                "Accès interdit. Vous n'êtes pas le propriétaire de cette annonce.".to_string(),
            ));
        }
        Self::delete_annonce_owned(platform, annonce_id, user_id).await
    }

    /// Cascade sans re-vérification de propriété : l'appelant détient déjà
    /// l'autorité. La suppression finale reste filtrée par id ET propriétaire.
    async fn delete_annonce_owned(
        platform: &Platform,
        annonce_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), ApiError> {
        // 1. Les images d'abord : octets (best-effort) puis métadonnées.
        let annonce_images =
            images::get_images_by_annonce_id(platform.store.as_ref(), annonce_id).await?;
        for image in &annonce_images {
            images::delete_image(platform.store.as_ref(), platform.objects.as_ref(), image)
                .await?;
        }

        // 2. La ligne d'annonce. Zéro ligne touchée = échec.
        let deleted =
            annonces::delete_annonce(platform.store.as_ref(), annonce_id, user_id).await?;
        if deleted == 0 {
            tracing::error!(%annonce_id, %user_id, "suppression d'annonce sans effet");
            return Err(ApiError::Upstream(
                "Impossible de supprimer l'annonce de la base de données.".to_string(),
            ));
        }
        Ok(())
    }

    /// Supprime un compte utilisateur et tout ce qu'il possède :
    /// favoris, annonces (avec leurs images), profil, compte d'identité,
    /// puis révoque la session courante.
    pub async fn delete_user(platform: &Platform, user_id: Uuid) -> Result<(), ApiError> {
        let store = platform.store.as_ref();

        // 1. Favoris : best-effort, on continue même en cas d'échec.
        if let Err(err) = store
            .delete(favoris::TABLE, &[Filter::eq("user_id", user_id.to_string())])
            .await
        {
            tracing::warn!(error = %err, %user_id, "favoris non supprimés, on continue");
        }

        // 2. Annonces et images. Un échec isolé n'arrête pas la cascade.
        let owned = annonces::get_annonce_rows_by_user(store, user_id).await?;
        for annonce in &owned {
            if let Err(err) = Self::delete_annonce_owned(platform, annonce.id, user_id).await {
                tracing::warn!(error = %err, annonce_id = %annonce.id,
                    "cascade d'annonce incomplète, on continue");
            }
        }

        // 3. Le profil, une fois les enfants partis. Échec bloquant.
        users::delete_user(store, user_id).await.map_err(|_| {
            ApiError::Upstream(
                "Impossible de supprimer le compte utilisateur de la base de données."
                    .to_string(),
            )
        })?;

        // 4. Le compte d'identité, en dernier : un compte sans profil est
        // récupérable, un profil sans compte ne l'est pas.
        if let Err(err) = platform.identity.delete_account(user_id).await {
            tracing::error!(error = %err, %user_id,
                "compte d'identité non supprimé après la cascade");
        }

        // 5. Révocation de la session courante.
        if let Err(err) = platform.identity.sign_out().await {
            tracing::warn!(error = %err, "révocation de session impossible");
        }
        Ok(())
    }
}
