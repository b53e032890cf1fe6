//! Verification email content.

use serde::Serialize;

const SENDER_NAME: &str = "Plateforme Budgétaire Municipale";
const SUBJECT: &str = "Code de vérification - Plateforme Budgétaire Municipale";

/// A rendered email ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// `Name <address>` sender.
    pub from: String,
    /// Recipients.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
}

/// Render the verification email carrying `code`, valid for
/// `expiry_minutes`.
///
/// ```
/// use mail_relay::verification_email;
///
/// let email = verification_email("noreply@mairie.tn", "agent@mairie.tn", "042917", 10);
/// assert!(email.text.contains("042917"));
/// assert!(email.text.contains("10 minutes"));
/// ```
#[must_use]
pub fn verification_email(from: &str, to: &str, code: &str, expiry_minutes: u32) -> OutgoingEmail {
    OutgoingEmail {
        from: format!("{SENDER_NAME} <{from}>"),
        to: vec![to.to_owned()],
        subject: SUBJECT.to_owned(),
        html: html_body(code, expiry_minutes),
        text: text_body(code, expiry_minutes),
    }
}

fn html_body(code: &str, expiry_minutes: u32) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Code de vérification</title></head>
<body style="font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="color: #667eea;">{SENDER_NAME}</h1>
  <p>Bonjour,</p>
  <p>Vous avez demandé un code de vérification pour accéder à la plateforme.</p>
  <p style="font-size: 32px; font-weight: bold; letter-spacing: 5px; text-align: center;">{code}</p>
  <p>Ce code est valide pendant <strong>{expiry_minutes} minutes</strong>.</p>
  <p style="color: #999; font-size: 12px;">Si vous n'avez pas demandé ce code, veuillez ignorer cet email.</p>
</body>
</html>"#
    )
}

fn text_body(code: &str, expiry_minutes: u32) -> String {
    format!(
        "{SENDER_NAME}\n\n\
         Bonjour,\n\n\
         Vous avez demandé un code de vérification pour accéder à la plateforme.\n\n\
         Votre code de vérification est : {code}\n\n\
         Ce code est valide pendant {expiry_minutes} minutes.\n\n\
         Si vous n'avez pas demandé ce code, veuillez ignorer cet email.\n"
    )
}
