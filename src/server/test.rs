#[cfg(test)]
mod test {
    use crate::client::client::Client;
    use crate::client::error::ClientError;
    use crate::cmd::error::CommandError;
    use crate::config::ServerConfig;
    use crate::db::error::ZSetError;
    use crate::db::zset::{Aggregate, ScoredEntry};
    use crate::parser::frame::Frame;
    use crate::server::server;
    use bytes::Bytes;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    async fn start_server() -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let config = ServerConfig {
            db_num: 2,
            ..ServerConfig::default()
        };
        let handle = tokio::spawn(async move {
            server::run(listener, stopped, &config).await;
        });
        (addr, stop, handle)
    }

    fn command(words: &[&str]) -> Frame {
        let mut frame = Frame::array();
        for word in words {
            frame.push_str(word);
        }
        frame
    }

    #[tokio::test]
    async fn remote_sorted_set_round_trip() -> crate::Result<()> {
        let (addr, stop, handle) = start_server().await;

        let set = Client::connect(addr).await?.sorted_set("scores");
        assert_eq!(set.add_all(vec![("a", 1.0), ("b", 2.0), ("c", 3.0)]).await?, 3);
        assert_eq!(set.value_range_by_score(1.0, true, 3.0, false).await?, vec![Bytes::from("a"), Bytes::from("b")]);
        assert_eq!(set.count(1.0, true, 3.0, true).await?, 3);
        assert_eq!(set.rank("c").await?, Some(2));
        assert_eq!(set.rev_rank("c").await?, Some(0));
        assert_eq!(set.get_score("zz").await?, None);
        assert_eq!(set.add_score("a", 0.5).await?, 1.5);
        assert_eq!(
            set.entry_range_reversed(0, 0).await?,
            vec![ScoredEntry::new("c", 3.0)]
        );
        assert!(set.contains_all(["a", "b"]).await?);

        let other = Client::connect(addr).await?.sorted_set("other");
        other.add(2.0, "b").await?;
        assert_eq!(other.intersection(["scores", "other"]).await?, 1);
        assert_eq!(other.entry_range(0, -1).await?, vec![ScoredEntry::new("b", 4.0)]);

        let err = set.value_range_by_score_limit(1.0, true, 3.0, true, -1, 1).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        set.add(f64::INFINITY, "inf").await?;
        let err = set.add_score("inf", f64::NEG_INFINITY).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ZSetError>(), Some(&ZSetError::NotANumber));

        assert_eq!(set.poll_first().await?, Some(Bytes::from("a")));
        assert!(set.delete().await?);
        assert_eq!(set.size().await?, 0);

        drop(set);
        drop(other);
        let _ = stop.send(());
        handle.await?;
        Ok(())
    }

    #[tokio::test]
    async fn remote_nan_arguments_match_local_errors() -> crate::Result<()> {
        let (addr, stop, handle) = start_server().await;
        let set = Client::connect(addr).await?.sorted_set("k");
        set.add(1.0, "a").await?;

        let err = set.add(f64::NAN, "b").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        let err = set.add_score("a", f64::NAN).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        let err = set.union_with(Aggregate::Sum, vec![("k", f64::NAN)]).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        let err = set.count(f64::NAN, true, 1.0, true).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        let err = set.entry_range_by_score_reversed(0.0, true, f64::NAN, false).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ZSetError>(), Some(ZSetError::InvalidArgument(_))));
        assert_eq!(set.entry_range(0, -1).await?, vec![ScoredEntry::new("a", 1.0)]);

        drop(set);
        let _ = stop.send(());
        handle.await?;
        Ok(())
    }

    #[tokio::test]
    async fn remote_select_isolates_databases() -> crate::Result<()> {
        let (addr, stop, handle) = start_server().await;

        let mut client = Client::connect(addr).await?;
        client.ping().await?;
        assert_eq!(client.execute(&command(&["zadd", "k", "1", "a"])).await?, Frame::Integer(1));
        client.select(1).await?;
        assert_eq!(client.execute(&command(&["zcard", "k"])).await?, Frame::Integer(0));
        let err = client.select(9).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<CommandError>(), Some(CommandError::Server(_))));
        client.select(0).await?;
        assert_eq!(client.execute(&command(&["zcard", "k"])).await?, Frame::Integer(1));

        // malformed commands get an error reply and the connection stays usable
        let reply = client.execute(&command(&["zunknown", "k"])).await?;
        assert!(matches!(reply, Frame::Error(msg) if msg.starts_with("ERR")));
        let reply = client.execute(&command(&["zadd", "k", "one", "a"])).await?;
        assert!(matches!(reply, Frame::Error(msg) if msg.starts_with("ERR")));
        let reply = client.execute(&command(&["zadd", "k", "nan", "a"])).await?;
        assert!(matches!(reply, Frame::Error(msg) if msg.starts_with("INVALIDARG")));
        let reply = client.execute(&command(&["echo", "hi"])).await?;
        assert_eq!(reply, Frame::Bulk(Bytes::from("hi")));

        drop(client);
        let _ = stop.send(());
        handle.await?;
        Ok(())
    }

    #[tokio::test]
    async fn remote_failure_after_shutdown() -> crate::Result<()> {
        let (addr, stop, handle) = start_server().await;
        let set = Client::connect(addr).await?.sorted_set("k");
        set.add(1.0, "a").await?;

        let _ = stop.send(());
        handle.await?;

        let err = set.size().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ClientError>(), Some(ClientError::ChannelFailure(_))));
        Ok(())
    }
}
