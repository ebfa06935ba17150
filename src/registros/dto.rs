use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Merchant-registration form payload: the 26 business fields of the
/// six-step form, all optional at the type level. Presence of the
/// mandatory ones is checked on create.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistroForm {
    // Identificação
    pub tipo_pessoa: Option<String>,
    pub cnpj: Option<String>,
    pub razao_social: Option<String>,
    pub nome_fantasia: Option<String>,
    pub data_abertura: Option<String>,
    pub capital_social: Option<f64>,
    pub regime_tributario: Option<String>,
    pub inscricao_estadual: Option<String>,
    // Responsável legal
    pub resp_nome: Option<String>,
    pub resp_cpf: Option<String>,
    pub resp_email: Option<String>,
    pub resp_telefone: Option<String>,
    // Segmento & produto
    pub segmento: Option<String>,
    pub descricao_produtos: Option<String>,
    pub origem_produtos: Option<String>,
    pub produtos_restritos: Option<bool>,
    // Estrutura & logística
    pub possui_loja: Option<bool>,
    pub possui_estoque: Option<bool>,
    pub estoque_cep: Option<String>,
    pub estoque_endereco: Option<String>,
    pub logistica_envio: Option<String>,
    // Financeiro
    pub emissao_nf: Option<String>,
    pub banco: Option<String>,
    pub agencia: Option<String>,
    pub conta: Option<String>,
    pub tipo_conta: Option<String>,
    // Estratégia
    pub volume_pedidos: Option<String>,
    // Aceite
    pub aceite_termos: Option<bool>,
    pub aceite_veracidade: Option<bool>,
}

impl RegistroForm {
    /// Name of the first mandatory field that is missing, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.tipo_pessoa.is_none() {
            Some("tipo_pessoa")
        } else if self.aceite_termos.is_none() {
            Some("aceite_termos")
        } else if self.aceite_veracidade.is_none() {
            Some("aceite_veracidade")
        } else if self.resp_nome.is_none() {
            Some("resp_nome")
        } else if self.resp_email.is_none() {
            Some("resp_email")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> RegistroForm {
        serde_json::from_value(serde_json::json!({
            "tipo_pessoa": "PJ",
            "aceite_termos": true,
            "aceite_veracidade": true,
            "resp_nome": "Ana",
            "resp_email": "ana@exemplo.com",
        }))
        .unwrap()
    }

    #[test]
    fn complete_form_has_no_missing_field() {
        assert!(complete().missing_required_field().is_none());
    }

    #[test]
    fn missing_required_field_is_named() {
        let mut form = complete();
        form.aceite_termos = None;
        assert_eq!(form.missing_required_field(), Some("aceite_termos"));
    }
}
