use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tracing::debug;

use bankd_core::{AccountName, Amount, BankError};
use bankd_protocol::{CodecError, MessageCodec, reply};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Refused locally (nothing was sent), or the server closed the connection.
    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ClientError {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Bank(err) if err.is_fatal())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Codec(CodecError::Io(err))
    }
}

/// One connection to the banking server.
#[derive(Debug)]
pub struct BankClient {
    framed: Framed<TcpStream, MessageCodec>,
}

impl BankClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            framed: Framed::new(stream, MessageCodec::new()),
        })
    }

    /// Send one message without waiting for the reply.
    pub async fn send(&mut self, message: &str) -> Result<(), ClientError> {
        debug!(text = message, "send");
        self.framed.send(message).await?;
        Ok(())
    }

    /// Next message from the server (a reply or a server notice).
    pub async fn recv(&mut self) -> Result<String, ClientError> {
        match self.framed.next().await {
            Some(Ok(message)) => {
                debug!(text = %message, "recv");
                Ok(message)
            }
            Some(Err(err)) => Err(err.into()),
            None => Err(BankError::ConnectionClosed.into()),
        }
    }

    /// Validate, send, and wait for the reply.
    pub async fn request(&mut self, line: &str) -> Result<String, ClientError> {
        crate::input::validate(line)?;
        self.send(line.trim()).await?;
        self.recv().await
    }

    pub async fn create(&mut self, name: &AccountName) -> Result<String, ClientError> {
        self.request(&format!("create {name}")).await
    }

    pub async fn serve(&mut self, name: &AccountName) -> Result<String, ClientError> {
        self.request(&format!("serve {name}")).await
    }

    pub async fn deposit(&mut self, amount: Amount) -> Result<String, ClientError> {
        self.request(&format!("deposit {amount}")).await
    }

    pub async fn withdraw(&mut self, amount: Amount) -> Result<String, ClientError> {
        self.request(&format!("withdraw {amount}")).await
    }

    pub async fn query(&mut self) -> Result<String, ClientError> {
        self.request("query").await
    }

    pub async fn end(&mut self) -> Result<String, ClientError> {
        self.request("end").await
    }

    /// Send `quit` and wait for the server's acknowledgement.
    pub async fn quit(mut self) -> Result<(), ClientError> {
        let ack = self.request(reply::QUIT).await?;
        if ack != reply::QUIT {
            debug!(reply = %ack, "unexpected reply to quit");
        }
        Ok(())
    }
}
