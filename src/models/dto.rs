use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

/// Désérialise en double option : champ absent -> None,
/// `null` -> Some(None), valeur -> Some(Some(v)).
/// Les trois états comptent pour les mises à jour partielles.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

// DTO pour l'inscription. Les bornes de longueur passent par validator,
// les formats (email, téléphone) par services::validation.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    pub email: String,
    #[validate(length(
        min = 6,
        message = "Le mot de passe doit contenir au moins 6 caractères."
    ))]
    pub password: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Le pseudo doit contenir entre 3 et 50 caractères."
    ))]
    pub pseudo: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Le prénom doit contenir entre 2 et 50 caractères."
    ))]
    pub prenom: Option<String>,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Le nom doit contenir entre 2 et 50 caractères."
    ))]
    pub nom: Option<String>,
    pub telephone: Option<String>,
    #[validate(length(
        min = 3,
        max = 100,
        message = "La localité doit contenir entre 3 et 100 caractères."
    ))]
    pub localite: Option<String>,
}

impl SignupRequest {
    /// Les bornes s'entendent sur la longueur une fois les espaces retirés.
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_string();
        self.pseudo = self.pseudo.trim().to_string();
        trim_opt(&mut self.prenom);
        trim_opt(&mut self.nom);
        trim_opt(&mut self.telephone);
        trim_opt(&mut self.localite);
    }
}

fn trim_opt(field: &mut Option<String>) {
    if let Some(v) = field {
        *v = v.trim().to_string();
    }
}

// DTO pour la connexion
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email et mot de passe sont requis."))]
    pub email: String,
    #[validate(length(min = 1, message = "Email et mot de passe sont requis."))]
    pub password: String,
}

/// Mise à jour partielle d'une annonce. Aucun champ n'est nullable :
/// `null` explicite est rejeté, champ absent laissé intact. Les champs
/// immuables (id, user_id, created_at) sont ignorés par désérialisation.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAnnonceRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub titre: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    // Nombre ou chaîne selon le client, null distinct d'absent.
    pub prix: Option<Value>,
    pub category_id: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub localite: Option<Option<String>>,
}

/// Mise à jour partielle d'un profil. telephone/prenom/nom/localite/avatar_url
/// acceptent un `null` explicite (remise à zéro), le pseudo non.
/// id, email, password, created_at, last_active sont ignorés silencieusement.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub pseudo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub prenom: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nom: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub telephone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub localite: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AddFavoriRequest {
    pub annonce_id: Option<String>,
}

/// Champs d'annonce validés et normalisés, prêts à insérer.
#[derive(Debug, Clone)]
pub struct NewAnnonce {
    pub titre: String,
    pub description: String,
    pub prix: f64,
    pub localite: String,
    pub category_id: i64,
}
