//! Email templates.
//!
//! Every user-supplied value passes through [`escape_html`] before it is
//! embedded. Rendering reads no clock: the timestamp line shows the record's
//! `submittedAt`.

use chrono::{DateTime, Utc};

use super::escape::{escape_html, escape_multiline, header_safe};
use crate::submission::{ContactFields, QuoteFields, Submission, SubmissionFields, SubmissionKind};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: linear-gradient(135deg, #1e40af, #059669); color: white; padding: 20px; text-align: center; }
        .content { background: #f8f9fa; padding: 20px; }
        .field { margin-bottom: 15px; }
        .label { font-weight: bold; color: #1e40af; }
        .value { margin-left: 10px; }
        .block { background: white; padding: 15px; border-left: 4px solid #1e40af; margin-top: 10px; }
        .cta { background: #059669; color: white; padding: 15px; text-align: center; margin: 20px 0; border-radius: 5px; }
        .footer { background: #1f2937; color: white; padding: 15px; text-align: center; font-size: 12px; }
"#;

/// Business identity shown in every template.
#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub company_name: String,
    pub site_url: String,
    pub contact_email: String,
}

/// The two messages produced for an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSubmission {
    pub operator_subject: String,
    pub operator_body: String,
    pub client_subject: String,
    pub client_body: String,
}

/// Render the operator notification and client acknowledgment.
pub fn render(submission: &Submission, branding: &Branding) -> RenderedSubmission {
    let (operator_subject, operator_body) = match &submission.fields {
        SubmissionFields::Quote(q) => (
            format!("🎯 Nouvelle demande de devis - {}", header_safe(&q.company)),
            quote_notification(&submission.id, q, submission.submitted_at, branding),
        ),
        SubmissionFields::Contact(c) => (
            format!("📧 Nouveau message de contact - {}", header_safe(&c.subject)),
            contact_notification(&submission.id, c, submission.submitted_at, branding),
        ),
    };

    let client_subject = match submission.kind() {
        SubmissionKind::Quote => "✅ Confirmation de votre demande de devis - IO Metric",
        SubmissionKind::Contact => "✅ Confirmation de votre message - IO Metric",
    };

    RenderedSubmission {
        operator_subject,
        operator_body,
        client_subject: client_subject.to_string(),
        client_body: acknowledgment(
            submission.fields.salutation_name(),
            submission.kind(),
            branding,
        ),
    }
}

/// Subject and body of the provider configuration check email.
pub fn render_test_email(provider: &str, sent_at: DateTime<Utc>) -> (String, String) {
    let subject = format!("🧪 Test Email - {} Configuration", header_safe(provider));
    let body = format!(
        "<h2>Test Email</h2>\n\
         <p>This is a test email to verify {provider} configuration.</p>\n\
         <p>Sent at: {sent_at}</p>\n\
         <p>Service: {provider}</p>\n",
        provider = escape_html(provider),
        sent_at = format_timestamp(sent_at),
    );
    (subject, body)
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M:%S UTC").to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn field(label: &str, value: &str) -> String {
    format!(
        "          <div class=\"field\">\n            <span class=\"label\">{label}:</span>\n            <span class=\"value\">{value}</span>\n          </div>\n"
    )
}

fn block_field(label: &str, value: &str) -> String {
    format!(
        "          <div class=\"field\">\n            <span class=\"label\">{label}:</span>\n            <div class=\"block\">{value}</div>\n          </div>\n"
    )
}

fn page(title: &str, branding: &Branding, content: &str, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <style>{STYLE}    </style>
  </head>
  <body>
    <div class="container">
      <div class="header">
        <h1>{title}</h1>
        <p>{company}</p>
      </div>
      <div class="content">
{content}      </div>
      <div class="footer">
{footer}      </div>
    </div>
  </body>
</html>
"#,
        company = escape_html(&branding.company_name),
    )
}

fn quote_notification(id: &str, q: &QuoteFields, at: DateTime<Utc>, branding: &Branding) -> String {
    let mut content = String::from("        <h2>Informations du Client</h2>\n");
    content.push_str(&field("ID de la demande", &escape_html(id)));
    content.push_str(&field("Nom", &escape_html(&q.full_name())));
    content.push_str(&field("Email", &escape_html(&q.email)));
    content.push_str(&field(
        "Téléphone",
        &escape_html(non_blank(q.phone.as_deref()).unwrap_or("Non renseigné")),
    ));
    content.push_str(&field("Entreprise", &escape_html(&q.company)));
    content.push_str(&field("Secteur d'activité", &escape_html(&q.industry)));
    content.push_str(&field("Type de projet", &escape_html(&q.project_type)));
    content.push_str(&block_field("Description du projet", &escape_multiline(&q.description)));
    content.push_str(&field("Date de soumission", &format_timestamp(at)));

    let footer = format!(
        "        <p>Cette demande a été soumise via le site web {}</p>\n        <p>Répondre sous 24h maximum</p>\n",
        escape_html(&branding.company_name)
    );

    page("🎯 Nouvelle Demande de Devis", branding, &content, &footer)
}

fn contact_notification(
    id: &str,
    c: &ContactFields,
    at: DateTime<Utc>,
    branding: &Branding,
) -> String {
    let mut content = String::from("        <h2>Informations du Contact</h2>\n");
    content.push_str(&field("ID du message", &escape_html(id)));
    content.push_str(&field("Nom", &escape_html(&c.name)));
    content.push_str(&field("Email", &escape_html(&c.email)));
    content.push_str(&field(
        "Entreprise",
        &escape_html(non_blank(c.company.as_deref()).unwrap_or("Non renseignée")),
    ));
    content.push_str(&field("Sujet", &escape_html(&c.subject)));
    content.push_str(&block_field("Message", &escape_multiline(&c.message)));
    content.push_str(&field("Date de soumission", &format_timestamp(at)));

    let footer =
        "        <p>Ce message a été envoyé via le formulaire de contact du site web</p>\n".to_string();

    page("📧 Nouveau Message de Contact", branding, &content, &footer)
}

fn acknowledgment(name: &str, kind: SubmissionKind, branding: &Branding) -> String {
    let what = match kind {
        SubmissionKind::Quote => "demande de devis",
        SubmissionKind::Contact => "message",
    };
    let company = escape_html(&branding.company_name);

    let content = format!(
        r#"        <h2>Bonjour {name},</h2>
        <p>Nous avons bien reçu votre {what} et nous vous remercions de votre intérêt pour nos solutions de monitoring industriel.</p>
        <div class="cta">
          <h3>⏱️ Délai de réponse: 24h maximum</h3>
        </div>
        <p><strong>Prochaines étapes:</strong></p>
        <ul>
          <li>📋 Analyse de votre demande par notre équipe technique</li>
          <li>📞 Prise de contact sous 24h</li>
          <li>🎯 Proposition personnalisée adaptée à vos besoins</li>
        </ul>
        <p>En attendant, n'hésitez pas à consulter nos <a href="{site}" style="color: #1e40af;">études de cas</a> pour découvrir comment nous avons aidé d'autres entreprises à optimiser leurs performances industrielles.</p>
        <p>Cordialement,<br>
        <strong>L'équipe {company}</strong></p>
"#,
        name = escape_html(name),
        site = escape_html(&branding.site_url),
    );

    let footer = format!(
        "        <p>{company} | Solutions de Monitoring Industriel</p>\n        <p>Email: {email} | Web: {site}</p>\n",
        email = escape_html(&branding.contact_email),
        site = escape_html(
            branding
                .site_url
                .trim_start_matches("https://")
                .trim_start_matches("http://")
        ),
    );

    page("✅ Confirmation de réception", branding, &content, &footer)
}
