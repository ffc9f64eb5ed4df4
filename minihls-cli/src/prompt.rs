// Interactive prompts used when the URL is not passed on the command line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::AppError;

/// Print `label` and read one trimmed line. End of input yields an empty string.
pub async fn ask<R, W>(reader: &mut R, writer: &mut W, label: &str) -> Result<String, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(label.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

/// Answers collected from the terminal.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PromptAnswers {
    pub url: String,
    pub proxy: Option<String>,
}

/// Ask for the playlist URL, then for an optional SOCKS5 proxy address.
pub async fn ask_url_and_proxy<R, W>(
    reader: &mut R,
    writer: &mut W,
    ask_proxy: bool,
) -> Result<PromptAnswers, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let url = ask(reader, writer, "Playlist URL: ").await?;
    if url.is_empty() {
        return Err(AppError::InvalidInput("no playlist URL given".to_string()));
    }

    let proxy = if ask_proxy {
        let proxy = ask(reader, writer, "Use Proxy (Default \"\"): ").await?;
        (!proxy.is_empty()).then_some(proxy)
    } else {
        None
    };

    Ok(PromptAnswers { url, proxy })
}

/// Prompt on the process terminal.
pub async fn ask_terminal(ask_proxy: bool) -> Result<PromptAnswers, AppError> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    ask_url_and_proxy(&mut stdin, &mut stdout, ask_proxy).await
}
