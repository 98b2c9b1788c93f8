// Template sources. Registered under the same name in the HTML and text registries.

macro_rules! html_page {
    ($title:literal, $body:literal) => {
        concat!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>"#,
            $title,
            r#"</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: #2563eb; color: white; padding: 20px; border-radius: 5px 5px 0 0; text-align: center; }
        .header h2 { margin: 0; }
        .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 5px 5px; }
        .message-box { background: #fff3cd; border-left: 4px solid #ffc107; padding: 15px; margin: 15px 0; }
        .file-info { background: white; padding: 15px; margin: 15px 0; border-left: 4px solid #2563eb; }
        .file-info p { margin: 5px 0; }
        .button { display: inline-block; padding: 12px 24px; background: #2563eb; color: white !important; text-decoration: none; border-radius: 5px; margin: 20px 0; }
        .link-text { font-size: 12px; color: #666; word-break: break-all; margin-top: 10px; }
        .footer { margin-top: 20px; font-size: 12px; color: #666; text-align: center; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h2>"#,
            $title,
            r#"</h2>
        </div>
        <div class="content">"#,
            $body,
            r#"
        </div>
    </div>
</body>
</html>
"#
        )
    };
}

pub(super) const UPLOAD_HTML_TEMPLATE: &str = html_page!(
    "Ny fil uppladdad",
    r#"
            <p>Någon har laddat upp en fil via din filförfrågan:</p>
            <div class="file-info">
                <p><strong>Förfrågan:</strong> {{request_title}}</p>
                <p><strong>Filnamn:</strong> {{file_name}}</p>
                <p><strong>Storlek:</strong> {{file_size}}</p>
                <p><strong>Uppladdad:</strong> {{uploaded_at}}</p>
                <p><strong>IP-adress:</strong> {{uploader_ip}}</p>
            </div>
            <a href="{{dashboard_url}}" class="button">Visa i dashboard</a>
            <div class="footer">
                <p>Filen finns nu i din dashboard och kan laddas ner.</p>
                <p>Detta är ett automatiskt meddelande från {{product_name}}.</p>
            </div>"#
);

pub(super) const UPLOAD_TEXT_TEMPLATE: &str = r#"Ny fil uppladdad!

Någon har laddat upp en fil via din filförfrågan:

Förfrågan: {{request_title}}
Filnamn: {{file_name}}
Storlek: {{file_size}}
Uppladdad: {{uploaded_at}}
IP-adress: {{uploader_ip}}

Logga in för att se och ladda ner filen:
{{dashboard_url}}

---
Detta är ett automatiskt meddelande från {{product_name}}.
"#;

pub(super) const DOWNLOAD_HTML_TEMPLATE: &str = html_page!(
    "Din fil har laddats ner",
    r#"
            <p>Någon har laddat ner en av dina filer:</p>
            <div class="file-info">
                <p><strong>Filnamn:</strong> {{file_name}}</p>
                <p><strong>Storlek:</strong> {{file_size}}</p>
                <p><strong>Nedladdad:</strong> {{downloaded_at}}</p>
                <p><strong>IP-adress:</strong> {{downloader_ip}}</p>
                <p><strong>Nedladdningar kvar:</strong> {{downloads_remaining}}</p>
            </div>
            <a href="{{dashboard_url}}" class="button">Visa i dashboard</a>
            <div class="footer">
                <p>Detta är ett automatiskt meddelande från {{product_name}}.</p>
            </div>"#
);

pub(super) const DOWNLOAD_TEXT_TEMPLATE: &str = r#"Din fil har laddats ner!

Någon har laddat ner en av dina filer:

Filnamn: {{file_name}}
Storlek: {{file_size}}
Nedladdad: {{downloaded_at}}
IP-adress: {{downloader_ip}}
Nedladdningar kvar: {{downloads_remaining}}

Logga in för att se detaljer:
{{dashboard_url}}

---
Detta är ett automatiskt meddelande från {{product_name}}.
"#;

pub(super) const SHARE_LINK_HTML_TEMPLATE: &str = html_page!(
    "Någon har delat en fil med dig",
    r#"
            {{#if message}}<div class="message-box"><strong>Meddelande:</strong><br/>{{message}}</div>{{/if}}
            <div class="file-info">
                <p><strong>Filnamn:</strong> {{file_name}}</p>
                <p><strong>Storlek:</strong> {{file_size}}</p>
            </div>
            <center>
                <a href="{{link}}" class="button">Ladda ner fil</a>
            </center>
            <div class="link-text">
                Eller kopiera denna länk:<br/>
                <code>{{link}}</code>
            </div>
            <div class="footer">
                <p>Detta är ett automatiskt meddelande från {{product_name}}.</p>
            </div>"#
);

pub(super) const SHARE_LINK_TEXT_TEMPLATE: &str = r#"Någon har delat en fil med dig

{{#if message}}Meddelande: {{message}}

{{/if}}Filnamn: {{file_name}}
Storlek: {{file_size}}

Ladda ner filen här: {{link}}

---
Detta är ett automatiskt meddelande från {{product_name}}.
"#;

pub(super) const TEAM_INVITATION_HTML_TEMPLATE: &str = html_page!(
    "Du har lagts till i ett team",
    r#"
            <p>Du har lagts till i teamet <strong>{{team_name}}</strong> hos {{company_name}}.</p>
            <p>Filer som delas med teamet syns nu under Teams när du loggar in.</p>
            <a href="{{teams_url}}" class="button">Öppna Teams</a>
            <div class="footer">
                <p>Detta är ett automatiskt meddelande från {{company_name}}.</p>
            </div>"#
);

pub(super) const TEAM_INVITATION_TEXT_TEMPLATE: &str = r#"Du har lagts till i ett team

Du har lagts till i teamet {{team_name}} hos {{company_name}}.
Filer som delas med teamet syns nu under Teams när du loggar in:
{{teams_url}}

---
Detta är ett automatiskt meddelande från {{company_name}}.
"#;

pub(super) const ACCOUNT_DELETION_HTML_TEMPLATE: &str = html_page!(
    "Ditt konto har raderats",
    r#"
            <p>Hej {{account_name}},</p>
            <p>Ditt konto och alla tillhörande filer har raderats permanent från {{product_name}}.</p>
            <p>Om du inte begärde detta, kontakta administratören omedelbart.</p>
            <div class="footer">
                <p>Detta är ett automatiskt meddelande från {{product_name}}.</p>
            </div>"#
);

pub(super) const ACCOUNT_DELETION_TEXT_TEMPLATE: &str = r#"Ditt konto har raderats

Hej {{account_name}},

Ditt konto och alla tillhörande filer har raderats permanent från {{product_name}}.
Om du inte begärde detta, kontakta administratören omedelbart.

---
Detta är ett automatiskt meddelande från {{product_name}}.
"#;

pub(super) const TEST_HTML_TEMPLATE: &str = html_page!(
    "Testmeddelande",
    r#"
            <p>E-postinställningarna fungerar. Meddelandet skickades via <strong>{{provider}}</strong>.</p>
            <p>Skickat: {{sent_at}}</p>
            <div class="footer">
                <p>Detta är ett automatiskt meddelande från {{product_name}}.</p>
            </div>"#
);

pub(super) const TEST_TEXT_TEMPLATE: &str = r#"Testmeddelande

E-postinställningarna fungerar. Meddelandet skickades via {{provider}}.
Skickat: {{sent_at}}

---
Detta är ett automatiskt meddelande från {{product_name}}.
"#;
