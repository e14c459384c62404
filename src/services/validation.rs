//! Règles de validation des entrées. Tout est vérifié avant la moindre
//! écriture ; une requête partiellement invalide est rejetée en bloc.
//! Les bornes de longueur sont inclusives et comptées en caractères,
//! sur la valeur débarrassée de ses espaces de bord.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use validator::ValidationErrors;

use crate::error::ApiError;
use crate::models::dto::{NewAnnonce, UpdateAnnonceRequest, UpdateProfileRequest};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_MIMES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("regex email"));
static RE_TELEPHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10,15}$").expect("regex téléphone"));

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn check_titre(titre: &str) -> Result<String, ApiError> {
    let titre = titre.trim();
    let len = char_len(titre);
    if !(5..=100).contains(&len) {
        return Err(ApiError::Validation(
            "Le titre doit être une chaîne de caractères entre 5 et 100 caractères.".to_string(),
        ));
    }
    Ok(titre.to_string())
}

pub fn check_description(description: &str) -> Result<String, ApiError> {
    let description = description.trim();
    let len = char_len(description);
    if !(10..=1000).contains(&len) {
        return Err(ApiError::Validation(
            "La description doit être une chaîne de caractères entre 10 et 1000 caractères."
                .to_string(),
        ));
    }
    Ok(description.to_string())
}

/// Le prix arrive en nombre JSON ou en chaîne (formulaire multipart).
pub fn check_prix(value: &Value) -> Result<f64, ApiError> {
    let prix = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match prix {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(ApiError::Validation(
            "Le prix doit être un nombre positif.".to_string(),
        )),
    }
}

pub fn check_category_id(value: &Value) -> Result<i64, ApiError> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ApiError::Validation(
            "L'ID de catégorie est invalide.".to_string(),
        )),
    }
}

pub fn check_localite(localite: &str) -> Result<String, ApiError> {
    let localite = localite.trim();
    let len = char_len(localite);
    if !(3..=100).contains(&len) {
        return Err(ApiError::Validation(
            "La localité doit être une chaîne de caractères entre 3 et 100 caractères."
                .to_string(),
        ));
    }
    Ok(localite.to_string())
}

pub fn check_pseudo(pseudo: &str) -> Result<String, ApiError> {
    let pseudo = pseudo.trim();
    if pseudo.is_empty() {
        return Err(ApiError::Validation(
            "Le pseudo ne peut pas être vide.".to_string(),
        ));
    }
    let len = char_len(pseudo);
    if !(3..=50).contains(&len) {
        return Err(ApiError::Validation(
            "Le pseudo doit contenir entre 3 et 50 caractères.".to_string(),
        ));
    }
    Ok(pseudo.to_string())
}

pub fn check_email(email: &str) -> Result<(), ApiError> {
    if !RE_EMAIL.is_match(email.trim()) {
        return Err(ApiError::Validation("Format d'email invalide.".to_string()));
    }
    Ok(())
}

pub fn check_telephone(telephone: &str) -> Result<(), ApiError> {
    if !RE_TELEPHONE.is_match(telephone.trim()) {
        return Err(ApiError::Validation(
            "Format de numéro de téléphone invalide. Doit être composé de 10 à 15 chiffres."
                .to_string(),
        ));
    }
    Ok(())
}

fn check_nom_prenom(value: &str, label: &str) -> Result<String, ApiError> {
    let value = value.trim();
    let len = char_len(value);
    if !(2..=50).contains(&len) {
        return Err(ApiError::Validation(format!(
            "Le {label} doit contenir entre 2 et 50 caractères."
        )));
    }
    Ok(value.to_string())
}

pub fn check_prenom(prenom: &str) -> Result<String, ApiError> {
    check_nom_prenom(prenom, "prénom")
}

pub fn check_nom(nom: &str) -> Result<String, ApiError> {
    check_nom_prenom(nom, "nom")
}

/// Type MIME et taille d'un fichier image envoyé en multipart.
pub fn check_image(
    content_type: Option<&str>,
    size: usize,
    file_name: &str,
) -> Result<(), ApiError> {
    match content_type {
        Some(mime) if ALLOWED_IMAGE_MIMES.contains(&mime) => {}
        _ => {
            return Err(ApiError::Validation(format!(
                "Type de fichier non supporté pour l'image {file_name}. \
                 Seules les images JPEG, PNG, GIF, WEBP sont autorisées."
            )));
        }
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(format!(
            "Fichier trop volumineux pour l'image {file_name}. \
             La taille maximale autorisée est 5 Mo."
        )));
    }
    Ok(())
}

/// Valide les champs d'une nouvelle annonce (formulaire multipart : tout
/// arrive en chaîne). Un champ vide ou absent vaut manquant.
pub fn validate_new_annonce(
    titre: Option<&str>,
    description: Option<&str>,
    prix: Option<&str>,
    localite: Option<&str>,
    category_id: Option<&str>,
) -> Result<NewAnnonce, ApiError> {
    fn present(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|s| !s.is_empty())
    }
    let (Some(titre), Some(description), Some(prix), Some(localite), Some(category_id)) = (
        present(titre),
        present(description),
        present(prix),
        present(localite),
        present(category_id),
    ) else {
        return Err(ApiError::Validation(
            "Tous les champs obligatoires (titre, description, prix, localité, catégorie) \
             sont requis."
                .to_string(),
        ));
    };

    Ok(NewAnnonce {
        titre: check_titre(titre)?,
        description: check_description(description)?,
        prix: check_prix(&Value::String(prix.to_string()))?,
        localite: check_localite(localite)?,
        category_id: check_category_id(&Value::String(category_id.to_string()))?,
    })
}

/// Construit le patch d'une mise à jour d'annonce. Champ absent : intact.
/// Champ présent mais invalide (y compris `null`) : rejet global, rien
/// n'est écrit.
pub fn validate_annonce_update(
    updates: &UpdateAnnonceRequest,
) -> Result<Map<String, Value>, ApiError> {
    let mut patch = Map::new();

    if let Some(titre) = &updates.titre {
        let titre = titre.as_deref().ok_or_else(|| {
            ApiError::Validation(
                "Le titre doit être une chaîne de caractères entre 5 et 100 caractères."
                    .to_string(),
            )
        })?;
        patch.insert("titre".to_string(), Value::String(check_titre(titre)?));
    }
    if let Some(description) = &updates.description {
        let description = description.as_deref().ok_or_else(|| {
            ApiError::Validation(
                "La description doit être une chaîne de caractères entre 10 et 1000 caractères."
                    .to_string(),
            )
        })?;
        patch.insert(
            "description".to_string(),
            Value::String(check_description(description)?),
        );
    }
    if let Some(prix) = &updates.prix {
        patch.insert("prix".to_string(), Value::from(check_prix(prix)?));
    }
    if let Some(category_id) = &updates.category_id {
        patch.insert(
            "category_id".to_string(),
            Value::from(check_category_id(category_id)?),
        );
    }
    if let Some(localite) = &updates.localite {
        let localite = localite.as_deref().ok_or_else(|| {
            ApiError::Validation(
                "La localité doit être une chaîne de caractères entre 3 et 100 caractères."
                    .to_string(),
            )
        })?;
        patch.insert(
            "localite".to_string(),
            Value::String(check_localite(localite)?),
        );
    }

    if patch.is_empty() {
        return Err(ApiError::Validation(
            "Impossible de mettre à jour l'annonce, vérifiez l'ID ou les données fournies."
                .to_string(),
        ));
    }
    Ok(patch)
}

/// Construit le patch d'une mise à jour de profil. telephone, prenom, nom,
/// localite et avatar_url acceptent un `null` explicite ; le pseudo non.
pub fn validate_profile_update(
    updates: &UpdateProfileRequest,
) -> Result<Map<String, Value>, ApiError> {
    let mut patch = Map::new();

    if let Some(pseudo) = &updates.pseudo {
        let pseudo = pseudo.as_deref().ok_or_else(|| {
            ApiError::Validation("Le pseudo ne peut pas être vide.".to_string())
        })?;
        patch.insert("pseudo".to_string(), Value::String(check_pseudo(pseudo)?));
    }
    if let Some(prenom) = &updates.prenom {
        let value = match prenom.as_deref() {
            Some(p) => Value::String(check_prenom(p)?),
            None => Value::Null,
        };
        patch.insert("prenom".to_string(), value);
    }
    if let Some(nom) = &updates.nom {
        let value = match nom.as_deref() {
            Some(n) => Value::String(check_nom(n)?),
            None => Value::Null,
        };
        patch.insert("nom".to_string(), value);
    }
    if let Some(telephone) = &updates.telephone {
        let value = match telephone.as_deref() {
            Some(t) => {
                check_telephone(t)?;
                Value::String(t.trim().to_string())
            }
            None => Value::Null,
        };
        patch.insert("telephone".to_string(), value);
    }
    if let Some(localite) = &updates.localite {
        let value = match localite.as_deref() {
            Some(l) => Value::String(check_localite(l)?),
            None => Value::Null,
        };
        patch.insert("localite".to_string(), value);
    }
    if let Some(avatar_url) = &updates.avatar_url {
        let value = match avatar_url.as_deref() {
            Some(url) => Value::String(url.trim().to_string()),
            None => Value::Null,
        };
        patch.insert("avatar_url".to_string(), value);
    }

    if patch.is_empty() {
        return Err(ApiError::Validation(
            "Impossible de mettre à jour le profil.".to_string(),
        ));
    }
    Ok(patch)
}

/// Aplatit les erreurs de `validator` vers le premier message lisible.
pub fn first_message(errors: &ValidationErrors) -> String {
    for field_errors in errors.field_errors().values() {
        if let Some(error) = field_errors.first() {
            if let Some(message) = &error.message {
                return message.to_string();
            }
        }
    }
    "Requête invalide.".to_string()
}
