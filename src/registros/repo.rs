use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::RegistroForm;

const FORM_COLUMNS: &str = "tipo_pessoa, cnpj, razao_social, nome_fantasia, data_abertura, \
     capital_social, regime_tributario, inscricao_estadual, \
     resp_nome, resp_cpf, resp_email, resp_telefone, \
     segmento, descricao_produtos, origem_produtos, produtos_restritos, \
     possui_loja, possui_estoque, estoque_cep, estoque_endereco, logistica_envio, \
     emissao_nf, banco, agencia, conta, tipo_conta, \
     volume_pedidos, aceite_termos, aceite_veracidade";

/// Persisted merchant registration, owned by one user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lojista {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub form: RegistroForm,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// Binds the 29 form fields in FORM_COLUMNS order.
macro_rules! bind_form {
    ($query:expr, $form:expr) => {
        $query
            .bind(&$form.tipo_pessoa)
            .bind(&$form.cnpj)
            .bind(&$form.razao_social)
            .bind(&$form.nome_fantasia)
            .bind(&$form.data_abertura)
            .bind($form.capital_social)
            .bind(&$form.regime_tributario)
            .bind(&$form.inscricao_estadual)
            .bind(&$form.resp_nome)
            .bind(&$form.resp_cpf)
            .bind(&$form.resp_email)
            .bind(&$form.resp_telefone)
            .bind(&$form.segmento)
            .bind(&$form.descricao_produtos)
            .bind(&$form.origem_produtos)
            .bind($form.produtos_restritos)
            .bind($form.possui_loja)
            .bind($form.possui_estoque)
            .bind(&$form.estoque_cep)
            .bind(&$form.estoque_endereco)
            .bind(&$form.logistica_envio)
            .bind(&$form.emissao_nf)
            .bind(&$form.banco)
            .bind(&$form.agencia)
            .bind(&$form.conta)
            .bind(&$form.tipo_conta)
            .bind(&$form.volume_pedidos)
            .bind($form.aceite_termos)
            .bind($form.aceite_veracidade)
    };
}

impl Lojista {
    /// List every registration owned by `user_id`, newest first.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Lojista>> {
        let sql = format!(
            "SELECT id, user_id, {FORM_COLUMNS}, created_at, updated_at \
             FROM lojistas WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, Lojista>(&sql)
            .bind(user_id)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        form: &RegistroForm,
    ) -> anyhow::Result<Lojista> {
        let placeholders: Vec<String> = (2..=30).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO lojistas (user_id, {FORM_COLUMNS}) VALUES ($1, {}) \
             RETURNING id, user_id, {FORM_COLUMNS}, created_at, updated_at",
            placeholders.join(", ")
        );
        let row = bind_form!(sqlx::query_as::<_, Lojista>(&sql).bind(user_id), form)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    /// Update a registration owned by `user_id`; `None` when the row does
    /// not exist or belongs to someone else.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        form: &RegistroForm,
    ) -> anyhow::Result<Option<Lojista>> {
        let assignments: Vec<String> = FORM_COLUMNS
            .split(',')
            .map(|c| c.trim())
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 3))
            .collect();
        let sql = format!(
            "UPDATE lojistas SET {}, updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, {FORM_COLUMNS}, created_at, updated_at",
            assignments.join(", ")
        );
        let row = bind_form!(sqlx::query_as::<_, Lojista>(&sql).bind(id).bind(user_id), form)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// Delete a registration owned by `user_id`; `false` when nothing
    /// matched.
    pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM lojistas WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
